use strum::{Display, EnumString};

/// Parser used to build the syntax tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ProviderKind {
    /// libclang: preprocesses the file using the compiler arguments.
    #[default]
    Clang,
    /// Tree-sitter: parses the raw text; no native library needed.
    TreeSitter,
}

/// Errors encountered while parsing a [`ProviderKind`] from text.
pub type ProviderKindParseError = strum::ParseError;
