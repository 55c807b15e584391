/// Delimiters describing one executable's command-line conventions.
///
/// An [`ArgsBuilder`](crate::ArgsBuilder) takes ownership of its syntax and
/// never changes it afterwards.
///
/// | field                  | default | example           |
/// |------------------------|---------|-------------------|
/// | `key_prefix`           | `""`    | `/`, `--`, `-`    |
/// | `key_value_separator`  | `""`    | `:`, `=`, `" "`   |
/// | `value_list_separator` | `;`     | `,`               |
/// | `path_quote`           | `"`     | `'`               |
/// | `argument_separator`   | `" "`   |                   |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSyntax {
    pub key_prefix:           String,
    pub key_value_separator:  String,
    pub value_list_separator: String,
    pub path_quote:           String,
    pub argument_separator:   String,
}

impl Default for ArgumentSyntax {
    fn default() -> Self {
        Self {
            key_prefix:           String::new(),
            key_value_separator:  String::new(),
            value_list_separator: ";".into(),
            path_quote:           "\"".into(),
            argument_separator:   " ".into(),
        }
    }
}

impl ArgumentSyntax {
    /// Syntax with the given key prefix and key/value separator, everything
    /// else at its default.
    pub fn new(key_prefix: impl Into<String>, key_value_separator: impl Into<String>) -> Self {
        Self {
            key_prefix: key_prefix.into(),
            key_value_separator: key_value_separator.into(),
            ..Self::default()
        }
    }

    /// `/key:value` — NUnit console, OpenCover, most Windows tools.
    pub fn slash_colon() -> Self {
        Self::new("/", ":")
    }

    /// `--key=value` — GNU style long options.
    pub fn double_dash() -> Self {
        Self::new("--", "=")
    }

    /// `-key value` — NuGet, git and friends.
    pub fn dash_space() -> Self {
        Self::new("-", " ")
    }

    pub fn with_value_list_separator(mut self, sep: impl Into<String>) -> Self {
        self.value_list_separator = sep.into();
        self
    }

    pub fn with_path_quote(mut self, quote: impl Into<String>) -> Self {
        self.path_quote = quote.into();
        self
    }

    pub fn with_argument_separator(mut self, sep: impl Into<String>) -> Self {
        self.argument_separator = sep.into();
        self
    }
}
