//! Canned requests and statements for the Pfarrerbuch knowledge base.

pub const DEFAULT_NL_TEXT: &str =
    "Füge einen neuen Pfarrer mit Vorname \"Max\" und Nachname \"Mustermann\" hinzu.";

pub const DEFAULT_STATEMENT: &str = "PREFIX voc:<http://meta-pfarrerbuch.evangelische-archive.de/vocabulary#>\n\
# SELECT ... / INSERT DATA ...";

pub const KPS_SAMPLE_QUERY: &str = "PREFIX voc:<http://meta-pfarrerbuch.evangelische-archive.de/vocabulary#>
PREFIX rdfs:<http://www.w3.org/2000/01/rdf-schema#>
SELECT ?person ?label WHERE {
  GRAPH <http://meta-pfarrerbuch.evangelische-archive.de/data/kps/> {
    ?person a voc:Pfarrer-in ;
            rdfs:label ?label .
  }
}
LIMIT 10";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateKind {
    Select,
    Insert,
    /// Fills the natural-language request instead of the statement.
    NaturalLanguage,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Select => "SELECT",
            TemplateKind::Insert => "INSERT",
            TemplateKind::NaturalLanguage => "NL",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Template {
    pub label: &'static str,
    pub kind: TemplateKind,
    pub text: &'static str,
}

pub const TEMPLATES: &[Template] = &[
    Template {
        label: "SELECT: pastors with names",
        kind: TemplateKind::Select,
        text: "PREFIX voc:<http://meta-pfarrerbuch.evangelische-archive.de/vocabulary#>
SELECT ?person ?vor ?nach WHERE {
  ?person a voc:Pfarrer-in ;
          voc:vorname ?vor ;
          voc:nachname ?nach .
} LIMIT 12",
    },
    Template {
        label: "INSERT: sample pastor",
        kind: TemplateKind::Insert,
        text: "PREFIX voc:<http://meta-pfarrerbuch.evangelische-archive.de/vocabulary#>
INSERT DATA { GRAPH <urn:nl2sparql:changes> {
  <urn:example:person:NEW> a voc:Pfarrer-in ;
      voc:vorname \"Anna\" ;
      voc:nachname \"Muster\" .
} }",
    },
    Template {
        label: "NL: add a pastor",
        kind: TemplateKind::NaturalLanguage,
        text: DEFAULT_NL_TEXT,
    },
];

pub fn template(index: usize) -> Option<&'static Template> {
    TEMPLATES.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::Statement;

    #[test]
    fn select_templates_pass_the_read_guard() {
        for template in TEMPLATES {
            let statement = Statement::from(template.text);
            match template.kind {
                TemplateKind::Select => assert!(statement.is_read_query(), "{}", template.label),
                TemplateKind::Insert => assert!(!statement.is_read_query(), "{}", template.label),
                TemplateKind::NaturalLanguage => {}
            }
        }
        assert!(Statement::from(KPS_SAMPLE_QUERY).is_read_query());
        assert!(!Statement::from(DEFAULT_STATEMENT).is_read_query());
    }

    #[test]
    fn lookup_is_bounds_checked() {
        assert_eq!(template(2).map(|t| t.kind), Some(TemplateKind::NaturalLanguage));
        assert!(template(TEMPLATES.len()).is_none());
    }
}
