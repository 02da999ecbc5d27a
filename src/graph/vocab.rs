//! Vocabulary terms used across the crate.

pub use oxigraph::model::vocab::{rdf, rdfs, xsd};

pub mod owl {
    use oxigraph::model::NamedNodeRef;

    pub const NAMESPACE: &str = "http://www.w3.org/2002/07/owl#";
    pub const ONTOLOGY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#Ontology");
    pub const CLASS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#Class");
    pub const IMPORTS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#imports");
}

/// SHACL core terms.
pub mod sh {
    use oxigraph::model::NamedNodeRef;

    pub const NAMESPACE: &str = "http://www.w3.org/ns/shacl#";

    macro_rules! shacl_terms {
        ($($name:ident => $local:literal),* $(,)?) => {
            $(
                pub const $name: NamedNodeRef<'_> =
                    NamedNodeRef::new_unchecked(concat!("http://www.w3.org/ns/shacl#", $local));
            )*
        };
    }

    shacl_terms! {
        NODE_SHAPE => "NodeShape",
        PROPERTY_SHAPE => "PropertyShape",
        PROPERTY => "property",
        PATH => "path",
        TARGET_CLASS => "targetClass",
        TARGET_NODE => "targetNode",
        TARGET_SUBJECTS_OF => "targetSubjectsOf",
        TARGET_OBJECTS_OF => "targetObjectsOf",
        DEACTIVATED => "deactivated",
        SEVERITY => "severity",
        MESSAGE => "message",
        NAME => "name",
        DESCRIPTION => "description",
        MIN_COUNT => "minCount",
        MAX_COUNT => "maxCount",
        DATATYPE => "datatype",
        CLASS => "class",
        NODE_KIND => "nodeKind",
        PATTERN => "pattern",
        FLAGS => "flags",
        MIN_LENGTH => "minLength",
        MAX_LENGTH => "maxLength",
        MIN_INCLUSIVE => "minInclusive",
        MAX_INCLUSIVE => "maxInclusive",
        IN => "in",
        HAS_VALUE => "hasValue",
        UNIQUE_LANG => "uniqueLang",
        MIN_EXCLUSIVE => "minExclusive",
        MAX_EXCLUSIVE => "maxExclusive",
        LANGUAGE_IN => "languageIn",
        EQUALS => "equals",
        DISJOINT => "disjoint",
        NODE => "node",
        NOT => "not",
        AND => "and",
        OR => "or",
        XONE => "xone",
        CLOSED => "closed",
        IGNORED_PROPERTIES => "ignoredProperties",
        QUALIFIED_VALUE_SHAPE => "qualifiedValueShape",
        QUALIFIED_MIN_COUNT => "qualifiedMinCount",
        QUALIFIED_MAX_COUNT => "qualifiedMaxCount",
        QUALIFIED_VALUE_SHAPES_DISJOINT => "qualifiedValueShapesDisjoint",
        INVERSE_PATH => "inversePath",
        ALTERNATIVE_PATH => "alternativePath",
        ZERO_OR_MORE_PATH => "zeroOrMorePath",
        ONE_OR_MORE_PATH => "oneOrMorePath",
        ZERO_OR_ONE_PATH => "zeroOrOnePath",
        IRI => "IRI",
        BLANK_NODE => "BlankNode",
        LITERAL => "Literal",
        BLANK_NODE_OR_IRI => "BlankNodeOrIRI",
        BLANK_NODE_OR_LITERAL => "BlankNodeOrLiteral",
        IRI_OR_LITERAL => "IRIOrLiteral",
        INFO => "Info",
        WARNING => "Warning",
        VIOLATION => "Violation",
        VALIDATION_REPORT => "ValidationReport",
        VALIDATION_RESULT => "ValidationResult",
        CONFORMS => "conforms",
        RESULT => "result",
        FOCUS_NODE => "focusNode",
        RESULT_PATH => "resultPath",
        RESULT_SEVERITY => "resultSeverity",
        RESULT_MESSAGE => "resultMessage",
        SOURCE_SHAPE => "sourceShape",
        SOURCE_CONSTRAINT_COMPONENT => "sourceConstraintComponent",
        VALUE => "value",
    }
}
