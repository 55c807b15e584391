use std::fmt;
use std::path::Path;

use crate::syntax::ArgumentSyntax;

// ---------------------------------------------------------------------------
// ArgsBuilder
// ---------------------------------------------------------------------------

/// Assembles the single argument string handed to an external process.
///
/// Every method consumes the builder and hands it back, so a command line
/// reads as one chain. Each `*_if` variant takes a condition; the plain
/// variant is the same call with `true`. A false condition or an empty
/// key/value leaves the builder untouched.
///
/// Paths are always wrapped in [`ArgumentSyntax::path_quote`]. The quote
/// character itself is not escaped, so a path containing it produces a
/// malformed command line.
///
/// # Example
///
/// ```rust
/// use buildshim::{ArgsBuilder, ArgumentSyntax};
///
/// let args = ArgsBuilder::new(ArgumentSyntax::slash_colon())
///     .add_path("tests/bin/Acme.Tests.dll")
///     .add_argument("framework", "net-4.0")
///     .add_arguments("include", ["Fast", "Unit"], false)
///     .add_key_if("noshadow", false)
///     .build();
///
/// assert_eq!(
///     args,
///     r#""tests/bin/Acme.Tests.dll" /framework:net-4.0 /include:Fast;Unit"#
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ArgsBuilder {
    syntax:       ArgumentSyntax,
    buffer:       String,
    was_modified: bool,
}

impl Default for ArgsBuilder {
    fn default() -> Self {
        Self::new(ArgumentSyntax::default())
    }
}

impl ArgsBuilder {
    pub fn new(syntax: ArgumentSyntax) -> Self {
        Self {
            syntax,
            buffer: String::new(),
            was_modified: false,
        }
    }

    pub fn syntax(&self) -> &ArgumentSyntax {
        &self.syntax
    }

    /// `true` until something has actually been appended.
    ///
    /// Callers use this to check that required arguments made it in before
    /// launching a process.
    pub fn is_empty(&self) -> bool {
        !self.was_modified
    }

    // ── Keys ──────────────────────────────────────────────────────────────

    /// Append `{prefix}{key}`.
    pub fn add_key(self, key: &str) -> Self {
        self.add_key_if(key, true)
    }

    pub fn add_key_if(self, key: &str, condition: bool) -> Self {
        if !condition || key.is_empty() {
            return self;
        }
        let token = self.key_token(key);
        self.append(token)
    }

    /// Append every non-empty key, prefixed, as one compound segment joined
    /// with the argument separator.
    pub fn add_keys<I, K>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.add_keys_if(keys, true)
    }

    pub fn add_keys_if<I, K>(self, keys: I, condition: bool) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        if !condition {
            return self;
        }
        let token = keys
            .into_iter()
            .filter(|k| !k.as_ref().is_empty())
            .map(|k| self.key_token(k.as_ref()))
            .collect::<Vec<_>>()
            .join(self.syntax.argument_separator.as_str());
        self.append(token)
    }

    // ── Values ────────────────────────────────────────────────────────────

    /// Append the value's string form verbatim.
    pub fn add_value(self, value: impl fmt::Display) -> Self {
        self.add_value_if(value, true)
    }

    pub fn add_value_if(self, value: impl fmt::Display, condition: bool) -> Self {
        if !condition {
            return self;
        }
        self.append(value.to_string())
    }

    /// Append all non-empty values as one segment joined with the argument separator.
    pub fn add_values<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: fmt::Display,
    {
        self.add_values_if(values, true)
    }

    pub fn add_values_if<I, V>(self, values: I, condition: bool) -> Self
    where
        I: IntoIterator<Item = V>,
        V: fmt::Display,
    {
        if !condition {
            return self;
        }
        let token = non_empty(values).join(self.syntax.argument_separator.as_str());
        self.append(token)
    }

    // ── Key/value arguments ───────────────────────────────────────────────

    /// Append `{prefix}{key}{kv_separator}{value}`.
    pub fn add_argument(self, key: &str, value: impl fmt::Display) -> Self {
        self.add_argument_if(key, value, true)
    }

    pub fn add_argument_if(self, key: &str, value: impl fmt::Display, condition: bool) -> Self {
        if !condition || key.is_empty() {
            return self;
        }
        let value = value.to_string();
        if value.is_empty() {
            return self;
        }
        let token = self.argument_token(key, &value);
        self.append(token)
    }

    /// Append `key` with several values.
    ///
    /// With `multiple_times` the key is repeated once per value
    /// (`/k:a /k:b`); otherwise the values are joined with the value-list
    /// separator into one argument (`/k:a;b`).
    pub fn add_arguments<I, V>(self, key: &str, values: I, multiple_times: bool) -> Self
    where
        I: IntoIterator<Item = V>,
        V: fmt::Display,
    {
        self.add_arguments_if(key, values, multiple_times, true)
    }

    pub fn add_arguments_if<I, V>(
        self,
        key: &str,
        values: I,
        multiple_times: bool,
        condition: bool,
    ) -> Self
    where
        I: IntoIterator<Item = V>,
        V: fmt::Display,
    {
        if !condition || key.is_empty() {
            return self;
        }
        self.keyed_list(key, non_empty(values), multiple_times)
    }

    // ── Paths ─────────────────────────────────────────────────────────────

    /// Append the path wrapped in the path quote.
    pub fn add_path(self, path: impl AsRef<Path>) -> Self {
        self.add_path_if(path, true)
    }

    pub fn add_path_if(self, path: impl AsRef<Path>, condition: bool) -> Self {
        if !condition {
            return self;
        }
        let path = path.as_ref().to_string_lossy();
        if path.is_empty() {
            return self;
        }
        let token = self.quote(&path);
        self.append(token)
    }

    /// Append `{prefix}{key}{kv_separator}"{path}"`.
    pub fn add_key_path(self, key: &str, path: impl AsRef<Path>) -> Self {
        self.add_key_path_if(key, path, true)
    }

    pub fn add_key_path_if(self, key: &str, path: impl AsRef<Path>, condition: bool) -> Self {
        if !condition || key.is_empty() {
            return self;
        }
        let path = path.as_ref().to_string_lossy();
        if path.is_empty() {
            return self;
        }
        let token = self.argument_token(key, &self.quote(&path));
        self.append(token)
    }

    /// Append every non-empty path, quoted, as one segment joined with the
    /// argument separator.
    pub fn add_paths<I, P>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.add_paths_if(paths, true)
    }

    pub fn add_paths_if<I, P>(self, paths: I, condition: bool) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        if !condition {
            return self;
        }
        let token = self
            .quoted_paths(paths)
            .join(self.syntax.argument_separator.as_str());
        self.append(token)
    }

    /// Quoted counterpart of [`add_arguments`](Self::add_arguments).
    pub fn add_key_paths<I, P>(self, key: &str, paths: I, multiple_times: bool) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.add_key_paths_if(key, paths, multiple_times, true)
    }

    pub fn add_key_paths_if<I, P>(
        self,
        key: &str,
        paths: I,
        multiple_times: bool,
        condition: bool,
    ) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        if !condition || key.is_empty() {
            return self;
        }
        let quoted = self.quoted_paths(paths);
        self.keyed_list(key, quoted, multiple_times)
    }

    // ── Terminal ──────────────────────────────────────────────────────────

    /// The finished argument string, without the trailing separator.
    pub fn build(self) -> String {
        self.as_str().to_owned()
    }

    fn as_str(&self) -> &str {
        if !self.was_modified {
            return &self.buffer;
        }
        self.buffer
            .strip_suffix(self.syntax.argument_separator.as_str())
            .unwrap_or(&self.buffer)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn append(mut self, token: String) -> Self {
        if token.is_empty() {
            return self;
        }
        self.buffer.push_str(&token);
        self.buffer.push_str(&self.syntax.argument_separator);
        self.was_modified = true;
        self
    }

    fn keyed_list(self, key: &str, values: Vec<String>, multiple_times: bool) -> Self {
        if multiple_times {
            let tokens: Vec<String> = values
                .iter()
                .map(|v| self.argument_token(key, v))
                .collect();
            return tokens.into_iter().fold(self, Self::append);
        }
        let joined = values.join(self.syntax.value_list_separator.as_str());
        if joined.is_empty() {
            return self;
        }
        let token = self.argument_token(key, &joined);
        self.append(token)
    }

    fn quoted_paths<I, P>(&self, paths: I) -> Vec<String>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        paths
            .into_iter()
            .map(|p| p.as_ref().to_string_lossy().into_owned())
            .filter(|p| !p.is_empty())
            .map(|p| self.quote(&p))
            .collect()
    }

    fn key_token(&self, key: &str) -> String {
        format!("{}{}", self.syntax.key_prefix, key)
    }

    fn argument_token(&self, key: &str, value: &str) -> String {
        format!(
            "{}{}{}{}",
            self.syntax.key_prefix, key, self.syntax.key_value_separator, value
        )
    }

    fn quote(&self, path: &str) -> String {
        format!("{q}{path}{q}", q = self.syntax.path_quote)
    }
}

impl fmt::Display for ArgsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ArgsBuilder> for String {
    fn from(builder: ArgsBuilder) -> Self {
        builder.build()
    }
}

fn non_empty<I, V>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = V>,
    V: fmt::Display,
{
    values
        .into_iter()
        .map(|v| v.to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
