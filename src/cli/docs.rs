//! Operator reference for the rules CLI

/// Get the operator table printed by `rules operators`
pub fn get_operator_table() -> &'static str {
    OPERATORS_DOC
}

const OPERATORS_DOC: &str = r#"RULE OPERATORS

A rule sequence is a flat list of separators, logicals, and criteria:

  {"type": "separator", "value": "BEGIN" | "END"}
  {"type": "logical",   "value": "AND" | "OR"}
  {"type": "criteria",  "attribute": "<path>", "relationship": "<REL>", "value": ...}
  {"type": "criteria",  "attribute": "<path>", "relationship": "<REL>", "values": [...]}

Every sequence is wrapped in BEGIN .. END, and one group uses one logical.

RELATIONSHIPS

  REL      OPERAND   DOCUMENT TARGET          SEARCH TARGET
  EQ       value     $eq                      term
  NE       value     $ne                      bool.must_not { term }
  GT       value     $gt                      range.gt
  LT       value     $lt                      range.lt
  GE       value     $gte                     range.gte
  LE       value     $lte                     range.lte
  IN       values    $in                      terms
  NI       values    $nin                     bool.must_not { terms }
  ALL      values    $all                     terms_set (every term)
  LIKE     value     $regex (case-insensitive) match
  PREFIX   value     $regex ^...              prefix

ATTRIBUTE PATHS

  prices.currency                      dotted path
  classifications[type:netbase].code   field of the element whose type is netbase

Sibling criteria under one array attribute are matched within the same
element ($elemMatch for documents, nested for search).

CONNECTIVES

  AND      $and     bool.filter (bool.must when any LIKE is present)
  OR       $or      bool.should

Rule groups: {"name": "...", "type": "group", "rules": [...]} entries are
compiled together and joined with AND.
"#;
