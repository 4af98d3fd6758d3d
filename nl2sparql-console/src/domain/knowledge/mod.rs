pub mod value_object;

pub use value_object::{OntologyTerm, OntologyTerms, RdfTerm, SelectResults};
