use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One bound value in a SPARQL JSON result row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdfTerm {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(
        rename = "xml:lang",
        alias = "lang",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectHead {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectBindings {
    #[serde(default)]
    pub bindings: Vec<BTreeMap<String, RdfTerm>>,
}

/// SPARQL 1.1 JSON results for SELECT/ASK.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectResults {
    #[serde(default)]
    pub head: SelectHead,
    #[serde(default)]
    pub results: SelectBindings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean: Option<bool>,
}

impl SelectResults {
    pub fn vars(&self) -> &[String] {
        &self.head.vars
    }

    pub fn rows(&self) -> &[BTreeMap<String, RdfTerm>] {
        &self.results.bindings
    }

    pub fn row_count(&self) -> usize {
        self.results.bindings.len()
    }

    pub fn cell(&self, row: usize, var: &str) -> Option<&RdfTerm> {
        self.results.bindings.get(row)?.get(var)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyTerm {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl OntologyTerm {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.uri)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyTerms {
    #[serde(default)]
    pub classes: Vec<OntologyTerm>,
    #[serde(default)]
    pub properties: Vec<OntologyTerm>,
}
