//! OData v2 query string builder.

use urlencoding::encode;

const QUERY_AND: &str = "and";
const QUERY_OR: &str = "or";
const QUERY_ASC: &str = "asc";
const QUERY_DESC: &str = "desc";

/// The named parts of a [`Select`] specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    /// Source table name.
    From,
    /// Projected column list (`$select`).
    Select,
    /// Filter clauses (`$filter`).
    Where,
    /// Order terms (`$orderby`).
    Order,
    /// Row count (`$top`).
    LimitCount,
    /// Row offset (`$skip`).
    LimitOffset,
    /// Count-only flag (`/$count`).
    Count,
}

/// Renders one part onto the accumulated query string.
type Renderer = fn(&Select, String) -> String;

/// Fixed rendering order; each renderer decides its own separator from the
/// output accumulated so far.
const RENDERERS: &[(Part, Renderer)] = &[
    (Part::From, Select::render_from),
    (Part::Select, Select::render_select),
    (Part::Where, Select::render_where),
    (Part::Order, Select::render_order),
    (Part::LimitOffset, Select::render_limit),
    (Part::Count, Select::render_count),
];

/// Builder for OData v2 query strings.
///
/// Accumulates the parts of a query and renders them in a fixed order:
/// FROM, `$select`, `$filter`, `$orderby`, `$top`/`$skip`, with count-only
/// mode overriding everything but the filter. Filter and order expressions
/// pass through uninterpreted; values substituted into conditions are not
/// escaped, so literals must arrive correctly formatted (e.g.
/// `guid'...'`).
///
/// # Example
///
/// ```
/// use odata_lib::query::Select;
///
/// let query = Select::new()
///     .from("Catalog_Products", &["Ref_Key", "Description"])
///     .where_("DeletionMark eq false")
///     .order("Description desc")
///     .limit(20, 0)
///     .assemble();
///
/// assert!(query.starts_with("Catalog_Products?$select=Ref_Key,Description&$filter="));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Select {
    from: String,
    columns: Vec<String>,
    filters: Vec<String>,
    order: Vec<(String, String)>,
    limit_count: i64,
    limit_offset: i64,
    count_only: bool,
}

impl Select {
    /// Creates an empty specification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source table and the projected columns.
    ///
    /// Replaces any previously set table and column list.
    pub fn from(mut self, table: impl Into<String>, columns: &[&str]) -> Self {
        self.from = table.into();
        self.columns = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Appends a filter clause combined with `and`.
    ///
    /// The clause is parenthesized; the first clause never gets a
    /// connector, whichever method added it.
    pub fn where_(mut self, condition: impl Into<String>) -> Self {
        let clause = self.make_where(condition.into(), QUERY_AND);
        self.filters.push(clause);
        self
    }

    /// Appends a filter clause combined with `and`, substituting every `?`
    /// in the condition with `value`. No escaping is performed.
    pub fn where_bind(self, condition: impl Into<String>, value: impl AsRef<str>) -> Self {
        let condition = condition.into().replace('?', value.as_ref());
        self.where_(condition)
    }

    /// Appends a filter clause combined with `or`.
    pub fn or_where(mut self, condition: impl Into<String>) -> Self {
        let clause = self.make_where(condition.into(), QUERY_OR);
        self.filters.push(clause);
        self
    }

    /// Appends a filter clause combined with `or`, substituting every `?`
    /// in the condition with `value`.
    pub fn or_where_bind(self, condition: impl Into<String>, value: impl AsRef<str>) -> Self {
        let condition = condition.into().replace('?', value.as_ref());
        self.or_where(condition)
    }

    /// Appends order terms.
    ///
    /// Accepts a single expression or a list. Each expression may end in a
    /// trailing `asc`/`desc` keyword (case-insensitive, preceded by a
    /// non-word character); without one the direction defaults to
    /// ascending. Empty expressions are skipped.
    pub fn order(mut self, spec: impl IntoOrderSpec) -> Self {
        for term in spec.into_terms() {
            if term.is_empty() {
                continue;
            }
            let (expression, direction) = match trailing_direction(&term) {
                Some(split) => split,
                None => (term, QUERY_ASC.to_string()),
            };
            self.order.push((expression, direction));
        }
        self
    }

    /// Sets a limit count and offset; missing values are coerced to 0.
    pub fn limit(mut self, count: impl Into<Option<i64>>, offset: impl Into<Option<i64>>) -> Self {
        self.limit_count = count.into().unwrap_or(0);
        self.limit_offset = offset.into().unwrap_or(0);
        self
    }

    /// Switches the query to count-only mode.
    pub fn count(mut self) -> Self {
        self.count_only = true;
        self
    }

    /// Clears every part back to its zero value.
    pub fn reset(self) -> Self {
        Self::default()
    }

    /// Clears one named part back to its zero value.
    pub fn reset_part(mut self, part: Part) -> Self {
        match part {
            Part::From => self.from = String::new(),
            Part::Select => self.columns = Vec::new(),
            Part::Where => self.filters = Vec::new(),
            Part::Order => self.order = Vec::new(),
            Part::LimitCount => self.limit_count = 0,
            Part::LimitOffset => self.limit_offset = 0,
            Part::Count => self.count_only = false,
        }
        self
    }

    /// Renders the query string.
    ///
    /// A specification without a table renders as the empty string.
    pub fn assemble(&self) -> String {
        if self.from.is_empty() {
            return String::new();
        }
        let mut query = String::new();
        for (_, renderer) in RENDERERS {
            query = renderer(self, query);
        }
        query
    }

    fn make_where(&self, condition: String, connector: &str) -> String {
        let mut clause = String::new();
        if !self.filters.is_empty() {
            clause.push_str(connector);
            clause.push(' ');
        }
        clause.push('(');
        clause.push_str(&condition);
        clause.push(')');
        clause
    }

    fn render_from(&self, mut query: String) -> String {
        query.push_str(&self.from);
        query.push('?');
        query
    }

    fn render_select(&self, mut query: String) -> String {
        if !self.columns.is_empty() {
            query.push_str("$select=");
            query.push_str(&self.columns.join(","));
        }
        query
    }

    fn render_where(&self, query: String) -> String {
        self.append_filter(query, !self.columns.is_empty())
    }

    /// Shared by the WHERE renderer and count-only mode, which recomputes
    /// the filter against a bare `?` base with no separator.
    fn append_filter(&self, mut query: String, separator: bool) -> String {
        if self.from.is_empty() || self.filters.is_empty() {
            return query;
        }
        if separator {
            query.push('&');
        }
        query.push_str("$filter=");
        query.push_str(&encode(&self.filters.join(" ")));
        query
    }

    fn render_order(&self, mut query: String) -> String {
        if self.order.is_empty() {
            return query;
        }
        let terms: Vec<String> = self
            .order
            .iter()
            .map(|(expression, direction)| match as_plain_integer(expression) {
                Some(n) => format!("{n} {direction}"),
                None => format!("{expression} {direction}"),
            })
            .collect();
        if !self.columns.is_empty() || !self.filters.is_empty() {
            query.push('&');
        }
        query.push_str("$orderby=");
        query.push_str(&encode(&terms.join(", ")));
        query
    }

    fn render_limit(&self, mut query: String) -> String {
        let mut count = 0i64;
        let mut offset = 0i64;

        if self.limit_offset != 0 {
            offset = self.limit_offset;
            // with only an offset, the count falls back to the widest page
            count = i64::MAX;
        }
        if self.limit_count != 0 {
            count = self.limit_count;
        }

        if count > 0 {
            if !self.columns.is_empty() || !self.filters.is_empty() || !self.order.is_empty() {
                query.push('&');
            }
            query.push_str(&format!("$top={count}&$skip={offset}"));
        }
        query
    }

    fn render_count(&self, query: String) -> String {
        if self.from.is_empty() || !self.count_only {
            return query;
        }
        self.append_filter(format!("{}/$count?", self.from), false)
    }
}

/// Conversion into a rendered OData query string.
pub trait IntoQuery {
    /// Renders the receiver.
    fn into_query(self) -> String;
}

impl IntoQuery for Select {
    fn into_query(self) -> String {
        self.assemble()
    }
}

impl IntoQuery for &Select {
    fn into_query(self) -> String {
        self.assemble()
    }
}

impl IntoQuery for String {
    fn into_query(self) -> String {
        self
    }
}

impl IntoQuery for &str {
    fn into_query(self) -> String {
        self.to_string()
    }
}

/// Order specification input: a single expression or a list of them.
pub trait IntoOrderSpec {
    /// Returns the individual order expressions.
    fn into_terms(self) -> Vec<String>;
}

impl IntoOrderSpec for &str {
    fn into_terms(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoOrderSpec for String {
    fn into_terms(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoOrderSpec for &[&str] {
    fn into_terms(self) -> Vec<String> {
        self.iter().map(|s| (*s).to_string()).collect()
    }
}

impl<const N: usize> IntoOrderSpec for [&str; N] {
    fn into_terms(self) -> Vec<String> {
        self.iter().map(|s| (*s).to_string()).collect()
    }
}

impl IntoOrderSpec for Vec<String> {
    fn into_terms(self) -> Vec<String> {
        self
    }
}

/// Splits a trailing whole-word `asc`/`desc` off an order expression,
/// keeping the keyword as typed.
fn trailing_direction(term: &str) -> Option<(String, String)> {
    let trimmed = term.trim_end();
    for direction in [QUERY_ASC, QUERY_DESC] {
        if trimmed.len() <= direction.len() {
            continue;
        }
        let split = trimmed.len() - direction.len();
        if !trimmed.is_char_boundary(split) {
            continue;
        }
        let (head, tail) = trimmed.split_at(split);
        if !tail.eq_ignore_ascii_case(direction) {
            continue;
        }
        let boundary = head
            .chars()
            .last()
            .is_some_and(|c| !c.is_alphanumeric() && c != '_');
        if boundary {
            return Some((head.trim().to_string(), tail.to_string()));
        }
    }
    None
}

/// Returns the integer value of an expression that is exactly a base-10
/// integer in canonical form.
fn as_plain_integer(expression: &str) -> Option<i64> {
    let n: i64 = expression.parse().ok()?;
    (n.to_string() == expression).then_some(n)
}
