use std::{ops::Range, sync::Arc};

use tracing::{debug, warn};

use crate::{
    catalog::CatalogService,
    models::{AccessToken, Movie},
    notify::Notice,
};

pub const PAGE_SIZE: usize = 8;

/// Derived view window over a list of `total_records` items.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Pagination {
    total_records: usize,
    current_page: usize,
}

impl Pagination {
    pub fn new(total_records: usize) -> Self {
        Self { total_records, current_page: 1 }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_records.div_ceil(PAGE_SIZE).max(1)
    }

    pub fn go_to_page(&mut self, page: i64) {
        let last = i64::try_from(self.total_pages()).unwrap_or(i64::MAX);
        // clamped into [1, last], so the cast back cannot truncate
        self.current_page = page.clamp(1, last) as usize;
    }

    pub fn next(&mut self) {
        if self.current_page < self.total_pages() {
            self.current_page += 1;
        }
    }

    pub fn prev(&mut self) {
        if self.current_page > 1 {
            self.current_page -= 1;
        }
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    /// Index range of the current page within the full list.
    pub fn window(&self) -> Range<usize> {
        let start = ((self.current_page - 1) * PAGE_SIZE).min(self.total_records);
        let end = (self.current_page * PAGE_SIZE).min(self.total_records);
        start..end
    }

    pub fn shows_controls(&self) -> bool {
        self.total_records > PAGE_SIZE
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ListState {
    Loading,
    Loaded { movies: Vec<Movie>, pagination: Pagination },
}

/// Fetches the catalog once and pages through it.
pub struct CatalogList {
    catalog: Arc<dyn CatalogService>,
    token: Option<AccessToken>,
    state: ListState,
}

impl CatalogList {
    pub fn new(catalog: Arc<dyn CatalogService>, token: Option<AccessToken>) -> Self {
        Self { catalog, token, state: ListState::Loading }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, ListState::Loading)
    }

    /// Runs the single fetch for this instance. A failed fetch still leaves
    /// the list loaded (empty) and hands back a notice for the user.
    pub async fn load_all(&mut self) -> Option<Notice> {
        if !self.is_loading() {
            return None;
        }

        let (movies, notice) = match self.catalog.list(self.token.as_ref()).await {
            Ok(movies) => {
                debug!(count = movies.len(), "catalog loaded");
                (movies, None)
            },
            Err(err) => {
                warn!(error = %err, "failed to load catalog");
                (Vec::new(), Some(Notice::error(format!("Failed to load movies: {err}"))))
            },
        };

        let pagination = Pagination::new(movies.len());
        self.state = ListState::Loaded { movies, pagination };
        notice
    }

    fn pagination_mut(&mut self) -> Option<&mut Pagination> {
        match &mut self.state {
            ListState::Loaded { pagination, .. } => Some(pagination),
            ListState::Loading => None,
        }
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        match &self.state {
            ListState::Loaded { pagination, .. } => Some(pagination),
            ListState::Loading => None,
        }
    }

    /// Sets the page a fresh view opens on.
    pub fn go_to_page(&mut self, page: i64) {
        if let Some(p) = self.pagination_mut() {
            p.go_to_page(page);
        }
    }

    pub fn displayed(&self) -> &[Movie] {
        match &self.state {
            ListState::Loaded { movies, pagination } => &movies[pagination.window()],
            ListState::Loading => &[],
        }
    }

    /// Every page window of the loaded list with its records, so paging
    /// never goes back to the service.
    pub fn pages(&self) -> Vec<(Pagination, &[Movie])> {
        let ListState::Loaded { movies, pagination } = &self.state else {
            return Vec::new();
        };

        (1..=pagination.total_pages())
            .map(|n| {
                let mut p = *pagination;
                p.go_to_page(n as i64);
                (p, &movies[p.window()])
            })
            .collect()
    }

    /// Loaded with no records at all, as opposed to still loading.
    pub fn is_empty(&self) -> bool {
        matches!(&self.state, ListState::Loaded { movies, .. } if movies.is_empty())
    }

    pub fn shows_pagination(&self) -> bool {
        self.pagination().is_some_and(Pagination::shows_controls)
    }
}
