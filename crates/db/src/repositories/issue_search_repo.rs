//! Execution of compiled issue searches: count, windowed page and grouped.

use sqlx::PgPool;
use tasklane_core::issue_fields::GroupBy;
use tasklane_core::issue_search::{IssueSearch, SearchParams, SearchScope};

use crate::models::issue::{GroupBucketRow, IssueRow};
use crate::models::issue_view::{
    CountResponse, IssueGroup, IssuesGroupedResponse, IssuesPageResponse, PaginationMeta,
};
use crate::repositories::IssueRelationRepo;
use crate::search::grouping::{build_discovery_sql, group_key, restrict_to_bucket};
use crate::search::plan::bind_values;
use crate::search::projector::project_page;
use crate::search::{
    compile_filters, compile_page, CollectSink, GroupSink, IssueQuery, SearchError, SearchOutcome,
};

/// Runs issue searches against the pool.
pub struct IssueSearchRepo;

impl IssueSearchRepo {
    /// Validate `params` and answer in the shape they ask for.
    ///
    /// Validation failures are returned before any query runs.
    pub async fn search(
        pool: &PgPool,
        params: SearchParams,
        scope: &SearchScope,
    ) -> Result<SearchOutcome, SearchError> {
        let search = params.validate()?;

        if search.only_count {
            let count = Self::count(pool, &search, scope).await?;
            return Ok(SearchOutcome::Count(CountResponse { count }));
        }

        match search.group_by {
            Some(group_by) => {
                let grouped = Self::search_grouped(pool, &search, scope, group_by).await?;
                Ok(SearchOutcome::Grouped(grouped))
            }
            None => Ok(SearchOutcome::Page(
                Self::find_page(pool, &search, scope).await?,
            )),
        }
    }

    // -----------------------------------------------------------------------
    // Flat
    // -----------------------------------------------------------------------

    /// Number of issues matching the filters. Materializes no rows.
    pub async fn count(
        pool: &PgPool,
        search: &IssueSearch,
        scope: &SearchScope,
    ) -> Result<i64, sqlx::Error> {
        let (sql, binds) = compile_filters(search, scope).build_count_sql();
        tracing::debug!(user_id = scope.user_id, %sql, "Counting issues");

        bind_values!(sqlx::query_scalar::<_, i64>(&sql), binds)
            .fetch_one(pool)
            .await
    }

    /// One page of issues with the exact total from the window count.
    ///
    /// An empty page reports a total of zero.
    pub async fn find_page(
        pool: &PgPool,
        search: &IssueSearch,
        scope: &SearchScope,
    ) -> Result<IssuesPageResponse, sqlx::Error> {
        let plan = compile_page(search, scope);
        let rows = Self::fetch_rows(pool, &plan, search).await?;
        let count = rows.first().map_or(0, |row| row.all_count);

        let index = IssueRelationRepo::load(pool, &rows, !search.light_search).await?;
        Ok(IssuesPageResponse {
            pagination_meta: PaginationMeta {
                count,
                offset: search.offset,
                limit: search.limit,
            },
            issues: project_page(&rows, &index, search.light_search),
        })
    }

    async fn fetch_rows(
        pool: &PgPool,
        plan: &IssueQuery,
        search: &IssueSearch,
    ) -> Result<Vec<IssueRow>, sqlx::Error> {
        let (sql, binds) = plan.build_page_sql(search.limit, search.offset);
        tracing::debug!(%sql, "Fetching issue page");

        bind_values!(sqlx::query_as::<_, IssueRow>(&sql), binds)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Grouped
    // -----------------------------------------------------------------------

    /// Discover buckets, then page each one and hand it to `sink` in order.
    ///
    /// Buckets are processed one after another. A sink error stops the run
    /// at once; buckets already emitted stay emitted. Every bucket is
    /// visited; `limit` and `offset` page the rows inside each one.
    ///
    /// Returns pagination metadata whose `count` is the number of buckets
    /// discovered and whose `offset`/`limit` echo the per-bucket window.
    pub async fn stream_grouped<S>(
        pool: &PgPool,
        search: &IssueSearch,
        scope: &SearchScope,
        group_by: GroupBy,
        sink: &mut S,
    ) -> Result<PaginationMeta, SearchError>
    where
        S: GroupSink + ?Sized,
    {
        let (sql, binds) = build_discovery_sql(&compile_filters(search, scope), group_by);
        tracing::debug!(user_id = scope.user_id, group_by = group_by.as_str(), %sql, "Discovering issue groups");

        let buckets = bind_values!(sqlx::query_as::<_, GroupBucketRow>(&sql), binds)
            .fetch_all(pool)
            .await?;

        let page_plan = compile_page(search, scope);
        for bucket in &buckets {
            let key = group_key(bucket);
            let mut plan = page_plan.clone();
            restrict_to_bucket(&mut plan, group_by, &key);

            let rows = Self::fetch_rows(pool, &plan, search).await?;
            let index = IssueRelationRepo::load(pool, &rows, !search.light_search).await?;
            let group = IssueGroup {
                group_key: key,
                group_label: bucket.group_label.clone(),
                bucket_count: bucket.bucket_count,
                items: project_page(&rows, &index, search.light_search),
            };

            tracing::debug!(
                group_by = group_by.as_str(),
                bucket_count = bucket.bucket_count,
                items = group.items.len(),
                "Emitting issue group"
            );
            sink.emit(group).await.map_err(SearchError::Sink)?;
        }

        Ok(PaginationMeta {
            count: buckets.len() as i64,
            offset: search.offset,
            limit: search.limit,
        })
    }

    /// Collect every bucket into one grouped response.
    pub async fn search_grouped(
        pool: &PgPool,
        search: &IssueSearch,
        scope: &SearchScope,
        group_by: GroupBy,
    ) -> Result<IssuesGroupedResponse, SearchError> {
        let mut sink = CollectSink::new();
        let pagination_meta = Self::stream_grouped(pool, search, scope, group_by, &mut sink).await?;
        Ok(IssuesGroupedResponse {
            pagination_meta,
            group_by,
            issues: sink.into_groups(),
        })
    }
}
