use sea_orm::{
    sea_query::{Expr, Func, SimpleExpr},
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select,
};

/// Filtered, ordered and paginated select over one entity
pub struct QueryBuilder<E: EntityTrait> {
    query: Select<E>,
    page: u64,
    limit: u64,
}

impl<E: EntityTrait> Default for QueryBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> QueryBuilder<E> {
    pub fn new() -> Self {
        Self {
            query: E::find(),
            page: 1,
            limit: 20,
        }
    }

    /// Add pagination; page is 1-based
    pub fn paginate(mut self, page: u64, limit: u64) -> Self {
        self.page = page.max(1);
        self.limit = limit.max(1);
        self
    }

    /// Add a filter condition
    pub fn filter(mut self, condition: Condition) -> Self {
        self.query = self.query.filter(condition);
        self
    }

    /// Add an optional filter condition
    pub fn filter_opt(self, condition: Option<Condition>) -> Self {
        match condition {
            Some(condition) => self.filter(condition),
            None => self,
        }
    }

    /// Add ordering
    pub fn order_by<C>(mut self, column: C, desc: bool) -> Self
    where
        C: ColumnTrait,
    {
        self.query = if desc {
            self.query.order_by_desc(column)
        } else {
            self.query.order_by_asc(column)
        };
        self
    }

    /// Execute the query and return one page plus the filtered total
    pub async fn execute<C>(self, db: &C) -> Result<(Vec<E::Model>, u64), sea_orm::DbErr>
    where
        C: ConnectionTrait,
        E::Model: Send + Sync,
    {
        let total = self.query.clone().count(db).await?;
        let items = self
            .query
            .limit(self.limit)
            .offset((self.page - 1) * self.limit)
            .all(db)
            .await?;

        Ok((items, total))
    }
}

/// Case-insensitive substring search across several columns (ORed)
#[derive(Default)]
pub struct SearchBuilder {
    pattern: String,
    conditions: Vec<SimpleExpr>,
}

impl SearchBuilder {
    pub fn new(term: &str) -> Self {
        Self {
            pattern: format!("%{}%", term.to_lowercase()),
            conditions: Vec::new(),
        }
    }

    /// LOWER(column) LIKE '%term%'
    pub fn add_like<C: ColumnTrait>(mut self, column: C) -> Self {
        let expr = Expr::expr(Func::lower(Expr::col(column))).like(self.pattern.clone());
        self.conditions.push(expr);
        self
    }

    /// LOWER(expression) LIKE '%term%' for computed values such as concatenations
    pub fn add_like_expr(mut self, expression: SimpleExpr) -> Self {
        let expr = Expr::expr(Func::lower(expression)).like(self.pattern.clone());
        self.conditions.push(expr);
        self
    }

    /// Build the final condition
    pub fn build(self) -> Option<Condition> {
        if self.conditions.is_empty() {
            None
        } else {
            Some(
                self.conditions
                    .into_iter()
                    .fold(Condition::any(), |acc, cond| acc.add(cond)),
            )
        }
    }
}
