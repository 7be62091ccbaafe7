use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    catalog::CatalogService,
    error::{AppError, AppResult, CatalogError, Field, ValidationErrors},
    models::{AccessToken, LocalFile, Movie, MovieFields, MovieId, Poster},
    notify::{Navigation, Notice},
    upload::upload_poster,
};

pub const TITLE_REQUIRED: &str = "Title is required";
pub const YEAR_REQUIRED: &str = "Valid year is required";
pub const POSTER_REQUIRED: &str = "Poster is required";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FormMode {
    Create,
    Edit(MovieId),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitState {
    Idle,
    InFlight,
    Saved,
    Failed,
}

/// Result of a successful submit.
#[derive(Clone, Debug, PartialEq)]
pub struct Saved {
    pub movie: Movie,
    pub notice: Notice,
    pub navigate: Navigation,
}

/// Field values that passed validation.
struct Checked {
    title: String,
    year: String,
    poster: Poster,
}

/// Editable state behind the create and edit movie forms.
pub struct MovieForm {
    catalog: Arc<dyn CatalogService>,
    token: Option<AccessToken>,
    mode: FormMode,
    title: String,
    year: String,
    poster: Option<Poster>,
    state: SubmitState,
}

impl MovieForm {
    pub fn create(catalog: Arc<dyn CatalogService>, token: Option<AccessToken>) -> Self {
        Self {
            catalog,
            token,
            mode: FormMode::Create,
            title: String::new(),
            year: String::new(),
            poster: None,
            state: SubmitState::Idle,
        }
    }

    /// Prefills an edit form from the stored record.
    pub async fn load_existing(
        catalog: Arc<dyn CatalogService>,
        token: Option<AccessToken>,
        id: MovieId,
    ) -> AppResult<Self> {
        let movie = match catalog.get_by_id(token.as_ref(), &id).await {
            Ok(movie) => movie,
            Err(CatalogError::NotFound) => {
                warn!(id = %id, "movie not found");
                return Err(AppError::NotFound(id));
            },
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            catalog,
            token,
            mode: FormMode::Edit(movie.id),
            title: movie.title,
            year: movie.year.to_string(),
            poster: movie.poster.map(Poster::Url),
            state: SubmitState::Idle,
        })
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn poster(&self) -> Option<&Poster> {
        self.poster.as_ref()
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    pub fn submitting(&self) -> bool {
        self.state == SubmitState::InFlight
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_year(&mut self, year: impl Into<String>) {
        self.year = year.into();
    }

    pub fn set_poster_file(&mut self, file: LocalFile) {
        self.poster = Some(Poster::Local(file));
    }

    /// Keeps a poster that was already uploaded by an earlier attempt.
    pub fn set_poster_url(&mut self, url: impl Into<String>) {
        self.poster = Some(Poster::Url(url.into()));
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.checked().map(|_| ())
    }

    fn checked(&self) -> Result<Checked, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push(Field::Title, TITLE_REQUIRED);
        }

        let year = self.year.trim();
        if year.is_empty() || year.parse::<i32>().is_err() {
            errors.push(Field::Year, YEAR_REQUIRED);
        }

        // An edit keeps its stored URL unless a new file is chosen
        if self.poster.is_none() {
            errors.push(Field::Poster, POSTER_REQUIRED);
        }

        match &self.poster {
            Some(poster) if errors.is_empty() => Ok(Checked {
                title: title.to_string(),
                year: year.to_string(),
                poster: poster.clone(),
            }),
            _ => Err(errors),
        }
    }

    /// Validates, uploads a newly selected poster, then writes the record.
    /// Every path out of `InFlight` ends in `Saved` or `Failed`. A second
    /// submit cannot start meanwhile: it needs the same `&mut self`.
    pub async fn submit(&mut self) -> AppResult<Saved> {
        let checked = self.checked().map_err(|errors| {
            debug!(errors = %errors, "movie form rejected");
            AppError::Validation(errors)
        })?;

        self.state = SubmitState::InFlight;
        let result = self.write(checked).await;
        self.state = match result {
            Ok(_) => SubmitState::Saved,
            Err(_) => SubmitState::Failed,
        };
        result
    }

    async fn write(&mut self, checked: Checked) -> AppResult<Saved> {
        let poster = match checked.poster {
            Poster::Url(url) => url,
            Poster::Local(file) => {
                let url = upload_poster(&*self.catalog, self.token.as_ref(), &file)
                    .await
                    .ok_or_else(|| AppError::Upload("Failed to upload poster.".into()))?;
                // a retry after a failed write reuses this upload
                self.poster = Some(Poster::Url(url.clone()));
                url
            },
        };

        let fields = MovieFields { title: checked.title, year: checked.year, poster };

        match &self.mode {
            FormMode::Create => match self.catalog.insert(self.token.as_ref(), &fields).await {
                Ok(movie) => {
                    info!(id = %movie.id, title = %movie.title, "movie created");
                    Ok(Saved {
                        movie,
                        notice: Notice::success("Movie created successfully!"),
                        navigate: Navigation::List,
                    })
                },
                Err(err) => {
                    warn!(error = %err, "failed to create movie");
                    Err(AppError::RecordWrite("Failed to create movie.".into()))
                },
            },
            FormMode::Edit(id) => match self.catalog.update(self.token.as_ref(), id, &fields).await {
                Ok(movie) => {
                    info!(id = %movie.id, title = %movie.title, "movie updated");
                    Ok(Saved {
                        movie,
                        notice: Notice::success("Movie updated successfully!"),
                        navigate: Navigation::List,
                    })
                },
                Err(CatalogError::NotFound) => Err(AppError::NotFound(id.clone())),
                Err(err) => {
                    warn!(id = %id, error = %err, "failed to update movie");
                    Err(AppError::RecordWrite("Failed to update movie.".into()))
                },
            },
        }
    }
}
