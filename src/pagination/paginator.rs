//! Paginator Module
//!
//! Translates page changes into re-issued requests with injected page
//! parameters.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::models::{PageData, PageParams, PagedQuery};
use crate::request::RequestExecutor;

// == Paginator ==
/// Page state layered over an executor of paged queries.
///
/// The filter part of a re-issued query is whatever the last successful
/// invocation used; page changes swap only the page position. Items and total are read from the
/// executor's last successful response, so a failed page request leaves the
/// previous page on display while `page` already reflects the request.
pub struct Paginator<P, T> {
    executor: RequestExecutor<PagedQuery<P>, PageData<T>>,
    position: Arc<Mutex<PageParams>>,
}

impl<P, T> Clone for Paginator<P, T> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            position: Arc::clone(&self.position),
        }
    }
}

impl<P, T> Paginator<P, T>
where
    P: Clone + Default + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Starts at page 1 with `page_size` items per page.
    pub fn new(executor: RequestExecutor<PagedQuery<P>, PageData<T>>, page_size: u32) -> Self {
        Self {
            executor,
            position: Arc::new(Mutex::new(PageParams::first(page_size))),
        }
    }

    /// Starts at page 1 with the configured page size.
    pub fn from_config(
        executor: RequestExecutor<PagedQuery<P>, PageData<T>>,
        config: &Config,
    ) -> Self {
        Self::new(executor, config.page_size)
    }

    fn position(&self) -> PageParams {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update_position(&self, f: impl FnOnce(&mut PageParams)) -> PageParams {
        let mut position = self.position.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut position);
        *position
    }

    // == Load ==
    /// Queries page 1 with a new filter.
    pub fn load(&self, filter: P) -> impl Future<Output = Result<PageData<T>>> + Send + 'static {
        let position = self.update_position(|p| p.page = 1);
        self.executor.execute(PagedQuery::new(filter, position))
    }

    // == Change Page ==
    /// Moves to `page` and re-issues the last successful query with the new
    /// position.
    ///
    /// No clamping happens here; a page the backend rejects fails through
    /// the executor's error path. Without a previous successful query the default
    /// filter is used.
    pub fn on_change_page(
        &self,
        page: u32,
    ) -> impl Future<Output = Result<PageData<T>>> + Send + 'static {
        let position = self.update_position(|p| p.page = page);
        debug!(page, page_size = position.page_size, "changing page");
        self.reissue(position)
    }

    /// Changes the page size and returns to page 1.
    pub fn on_change_page_size(
        &self,
        page_size: u32,
    ) -> impl Future<Output = Result<PageData<T>>> + Send + 'static {
        let position = self.update_position(|p| {
            p.page = 1;
            p.page_size = page_size;
        });
        debug!(page_size, "changing page size");
        self.reissue(position)
    }

    fn reissue(
        &self,
        position: PageParams,
    ) -> impl Future<Output = Result<PageData<T>>> + Send + 'static {
        let query = match self.executor.last_success_args() {
            Some(last) => last.with_page(position),
            None => PagedQuery::new(P::default(), position),
        };
        self.executor.execute(query)
    }

    // == Accessors ==
    pub fn page(&self) -> u32 {
        self.position().page
    }

    pub fn page_size(&self) -> u32 {
        self.position().page_size
    }

    /// Items of the last successful response.
    pub fn items(&self) -> Vec<T> {
        self.executor
            .state()
            .data
            .map(|page| page.items)
            .unwrap_or_default()
    }

    /// Total item count reported by the last successful response.
    pub fn total(&self) -> u64 {
        self.executor.state().data.map_or(0, |page| page.total)
    }

    pub fn executor(&self) -> &RequestExecutor<PagedQuery<P>, PageData<T>> {
        &self.executor
    }
}
