use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Languages the platform accepts, keyed by the identifier it reports on submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Language {
    Python,
    Python3,
    Cpp,
    Java,
    C,
    Csharp,
    Javascript,
    Typescript,
    Kotlin,
    Swift,
    Golang,
    Ruby,
    Scala,
    Rust,
    Mysql,
    Bash,
    Racket,
    Erlang,
    Elixir,
    Dart,
    Php,
    Perl,
    Haskell,
}

impl Language {
    pub fn extension(self) -> &'static str {
        match self {
            Language::Python | Language::Python3 => "py",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::C => "c",
            Language::Csharp => "cs",
            Language::Javascript => "js",
            Language::Typescript => "ts",
            Language::Kotlin => "kt",
            Language::Swift => "swift",
            Language::Golang => "go",
            Language::Ruby => "rb",
            Language::Scala => "scala",
            Language::Rust => "rs",
            Language::Mysql => "sql",
            Language::Bash => "sh",
            Language::Racket => "rkt",
            Language::Erlang => "erl",
            Language::Elixir => "ex",
            Language::Dart => "dart",
            Language::Php => "php",
            Language::Perl => "pl",
            Language::Haskell => "hs",
        }
    }

    /// Every known language identifier, in table order.
    pub fn all_keys() -> Vec<String> {
        Language::iter().map(|l| l.to_string()).collect()
    }
}

/// File extension for a language identifier; unknown languages use their
/// lowercase name.
pub fn extension_for(language: &str) -> String {
    match Language::from_str(language) {
        Ok(lang) => lang.extension().to_string(),
        Err(_) => language.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_languages_map_to_extensions() {
        assert_eq!(extension_for("python3"), "py");
        assert_eq!(extension_for("cpp"), "cpp");
        assert_eq!(extension_for("golang"), "go");
        assert_eq!(extension_for("CSharp"), "cs");
    }

    #[test]
    fn unknown_language_falls_back_to_lowercase_name() {
        assert_eq!(extension_for("Pythondata"), "pythondata");
        assert_eq!(extension_for("oraclesql"), "oraclesql");
    }

    #[test]
    fn all_keys_covers_the_table() {
        let keys = Language::all_keys();
        assert_eq!(keys.len(), 23);
        assert_eq!(keys[0], "python");
        assert!(keys.contains(&"haskell".to_string()));
    }
}
