//! Per-field export annotations.
//!
//! An annotation is a raw tag of the form `name[,token...]`. The first token
//! overrides the export name (empty derives one from the declared
//! identifier, `-` hides the field). The `inline` token flattens a nested
//! composite into its parent's namespace. Several namespaces can annotate the
//! same field; [`AnnotationPriority`] decides which one is consulted.

/// Token marking a member as inline.
pub const INLINE_TOKEN: &str = "inline";
/// Token asking the query builder to drop zero values.
pub const OMIT_EMPTY_TOKEN: &str = "omitempty";
/// Name token hiding a field entirely.
pub const EXCLUDE_TOKEN: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportName {
    /// Derive the name from the declared identifier.
    Derived,
    Explicit(String),
    /// The field is invisible to flattening.
    Excluded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub name: ExportName,
    pub inline: bool,
    /// Remaining tokens, e.g. `omitempty`.
    pub options: Vec<String>,
}

impl Default for Annotation {
    fn default() -> Self {
        Self {
            name: ExportName::Derived,
            inline: false,
            options: Vec::new(),
        }
    }
}

impl Annotation {
    /// Parses a raw tag such as `"display_name,omitempty"`.
    pub fn parse(raw: &str) -> Self {
        let mut tokens = raw.split(',');
        let name = match tokens.next().map(str::trim) {
            None | Some("") => ExportName::Derived,
            // `-,` spells a field literally named "-".
            Some(EXCLUDE_TOKEN) if !raw.contains(',') => ExportName::Excluded,
            Some(name) => ExportName::Explicit(name.to_string()),
        };

        let mut annotation = Self {
            name,
            ..Self::default()
        };
        for token in tokens.map(str::trim).filter(|token| !token.is_empty()) {
            if token == INLINE_TOKEN {
                annotation.inline = true;
            } else {
                annotation.options.push(token.to_string());
            }
        }
        annotation
    }

    /// Annotation exporting a field under exactly `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: ExportName::Explicit(name.into()),
            ..Self::default()
        }
    }

    pub fn is_excluded(&self) -> bool {
        self.name == ExportName::Excluded
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|candidate| candidate == option)
    }

    /// Export name for a member declared as `ident`, or `None` when excluded.
    pub fn export_name(&self, ident: &str) -> Option<String> {
        match &self.name {
            ExportName::Excluded => None,
            ExportName::Explicit(name) => Some(name.clone()),
            ExportName::Derived => Some(derive_name(ident)),
        }
    }
}

/// Lower-cases the leading letter of a declared identifier.
pub fn derive_name(ident: &str) -> String {
    let mut chars = ident.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Ordered list of annotation namespaces; the first one carrying a non-empty
/// tag on a field wins, even when a later namespace disagrees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationPriority(Vec<String>);

impl AnnotationPriority {
    pub fn new<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(namespaces.into_iter().map(Into::into).collect())
    }

    pub fn namespaces(&self) -> &[String] {
        &self.0
    }

    /// Picks the winning raw tag among `tags` and parses it.
    pub fn resolve(&self, tags: &[(String, String)]) -> Annotation {
        self.0
            .iter()
            .find_map(|namespace| {
                tags.iter()
                    .find(|(ns, raw)| ns == namespace && !raw.is_empty())
                    .map(|(_, raw)| Annotation::parse(raw))
            })
            .unwrap_or_default()
    }
}

impl Default for AnnotationPriority {
    fn default() -> Self {
        Self::new(["json", "url", "xml"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(ns, raw)| (ns.to_string(), raw.to_string()))
            .collect()
    }

    #[test]
    fn parses_name_and_tokens() {
        let annotation = Annotation::parse("display_name,omitempty,inline");
        assert_eq!(annotation.name, ExportName::Explicit("display_name".into()));
        assert!(annotation.inline);
        assert!(annotation.has_option(OMIT_EMPTY_TOKEN));
    }

    #[test]
    fn empty_name_derives_from_identifier() {
        let annotation = Annotation::parse(",inline");
        assert_eq!(annotation.name, ExportName::Derived);
        assert_eq!(annotation.export_name("UserName").as_deref(), Some("userName"));
    }

    #[test]
    fn dash_excludes_but_dash_comma_names() {
        assert!(Annotation::parse("-").is_excluded());
        let literal = Annotation::parse("-,");
        assert_eq!(literal.export_name("X").as_deref(), Some("-"));
    }

    #[test]
    fn first_non_empty_namespace_wins() {
        let priority = AnnotationPriority::default();
        let resolved =
            priority.resolve(&tags(&[("xml", "other,inline"), ("json", ""), ("url", "q")]));
        assert_eq!(resolved.name, ExportName::Explicit("q".into()));
        assert!(!resolved.inline);

        let none = priority.resolve(&tags(&[("yaml", "ignored")]));
        assert_eq!(none, Annotation::default());
    }
}
