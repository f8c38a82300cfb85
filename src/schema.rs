//! Naming of the typed side-arrays a schema-less table keeps its fields in.
//!
//! Every field lives in one of three parallel `name`/`value` array pairs, picked by the type of
//! the value it holds. A field is read with the index-of-name-then-value-at-index idiom:
//! `numbers.value[indexOf(numbers.name,'age')]`.

/// One of the three typed storage arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Numeric,
    Boolean,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub numbers: String,
    pub bools: String,
    pub strings: String,
    /// Field name that selects a match against the whole row instead of one field.
    pub source_field: String,
    /// Column holding the whole row as text.
    pub source_column: String,
    /// Function used to compare text case-insensitively.
    pub normalize: String,
}

impl Default for Schema {
    fn default() -> Self {
        Schema {
            numbers: "numbers".to_string(),
            bools: "bools".to_string(),
            strings: "strings".to_string(),
            source_field: "_source".to_string(),
            source_column: "_source".to_string(),
            normalize: "lowerUTF8".to_string(),
        }
    }
}

impl Schema {
    #[must_use]
    pub fn with_arrays(mut self, numbers: impl Into<String>, bools: impl Into<String>, strings: impl Into<String>) -> Self {
        self.numbers = numbers.into();
        self.bools = bools.into();
        self.strings = strings.into();
        self
    }

    #[must_use]
    pub fn with_source(mut self, field: impl Into<String>, column: impl Into<String>) -> Self {
        self.source_field = field.into();
        self.source_column = column.into();
        self
    }

    #[must_use]
    pub fn with_normalize(mut self, function: impl Into<String>) -> Self {
        self.normalize = function.into();
        self
    }

    fn array(&self, family: Family) -> &str {
        match family {
            Family::Numeric => &self.numbers,
            Family::Boolean => &self.bools,
            Family::Text => &self.strings,
        }
    }

    /// Expression reading `field` (already a quoted literal) from the array of `family`.
    pub fn column(&self, family: Family, field: &str) -> String {
        let array = self.array(family);
        format!("{array}.value[indexOf({array}.name,{field})]")
    }

    /// Wraps `text` in the case normalization function.
    pub fn normalized(&self, text: &str) -> String {
        format!("{}({})", self.normalize, text)
    }
}
