use std::str::FromStr;

/// Comparison a criteria rule applies between an attribute and its literal(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relationship {
    /// Equal (`EQ`)
    Eq,
    /// Not equal (`NE`)
    Ne,
    /// Greater than (`GT`)
    Gt,
    /// Less than (`LT`)
    Lt,
    /// Greater than or equal (`GE`)
    Ge,
    /// Less than or equal (`LE`)
    Le,
    /// Value is one of the listed values (`IN`)
    In,
    /// Value is none of the listed values (`NI`)
    Ni,
    /// Array contains all listed values (`ALL`)
    All,
    /// Full-text match (`LIKE`)
    Like,
    /// Starts with (`PREFIX`)
    Prefix,
}

impl Relationship {
    pub const ALL_RELATIONSHIPS: [Relationship; 11] = [
        Relationship::Eq,
        Relationship::Ne,
        Relationship::Gt,
        Relationship::Lt,
        Relationship::Ge,
        Relationship::Le,
        Relationship::In,
        Relationship::Ni,
        Relationship::All,
        Relationship::Like,
        Relationship::Prefix,
    ];

    /// Set relationships take `values`; every other relationship takes `value`.
    pub fn is_set(self) -> bool {
        matches!(self, Relationship::In | Relationship::Ni | Relationship::All)
    }

    /// Whether the relationship scores documents by relevance.
    pub fn is_full_text(self) -> bool {
        matches!(self, Relationship::Like)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Relationship::Eq => "EQ",
            Relationship::Ne => "NE",
            Relationship::Gt => "GT",
            Relationship::Lt => "LT",
            Relationship::Ge => "GE",
            Relationship::Le => "LE",
            Relationship::In => "IN",
            Relationship::Ni => "NI",
            Relationship::All => "ALL",
            Relationship::Like => "LIKE",
            Relationship::Prefix => "PREFIX",
        }
    }

    /// Look up this relationship's row in [`POLARITY`].
    pub fn polarity(self) -> Polarity {
        POLARITY
            .iter()
            .copied()
            .find(|p| p.relationship == self)
            .unwrap_or(Polarity {
                relationship: self,
                positive: self,
                negated: false,
            })
    }
}

impl FromStr for Relationship {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Relationship::ALL_RELATIONSHIPS
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl std::fmt::Display for Relationship {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A relationship split into its positive form and whether it negates it.
///
/// Both emitters read negation from here: the search target wraps the
/// positive leaf in `must_not`, the document target picks `$ne`/`$nin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Polarity {
    pub relationship: Relationship,
    pub positive: Relationship,
    pub negated: bool,
}

/// Relationships that have a distinct positive counterpart. Everything not
/// listed is its own positive form.
pub const POLARITY: [Polarity; 2] = [
    Polarity {
        relationship: Relationship::Ne,
        positive: Relationship::Eq,
        negated: true,
    },
    Polarity {
        relationship: Relationship::Ni,
        positive: Relationship::In,
        negated: true,
    },
];

/// Boolean connective between sibling clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}

impl FromStr for LogicalOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AND" => Ok(LogicalOp::And),
            "OR" => Ok(LogicalOp::Or),
            other => Err(other.to_string()),
        }
    }
}

impl std::fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Explicit grouping delimiter standing in for parentheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Separator {
    Begin,
    End,
}

impl Separator {
    pub fn as_str(self) -> &'static str {
        match self {
            Separator::Begin => "BEGIN",
            Separator::End => "END",
        }
    }
}

impl FromStr for Separator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BEGIN" => Ok(Separator::Begin),
            "END" => Ok(Separator::End),
            other => Err(other.to_string()),
        }
    }
}
