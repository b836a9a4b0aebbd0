#![forbid(unsafe_code)]

//! The three-way state of an asynchronous value.
//!
//! [`AsyncState<T>`] is a plain value: it is either still loading (optionally
//! with a progress fraction), holds data, or holds a failure message. It has
//! no behaviour beyond projection and matching; the notifiers in
//! `statecraft-runtime` own the transitions between variants.
//!
//! # Invariants
//!
//! 1. Exactly one of [`is_loading`](AsyncState::is_loading),
//!    [`has_data`](AsyncState::has_data) and
//!    [`has_error`](AsyncState::has_error) is true.
//! 2. A `Loading` progress, when present, lies in `[0.0, 1.0]` if it was
//!    built through [`AsyncState::loading_with_progress`].
//! 3. Equality is structural: variant tag plus payload.

/// State of an asynchronous value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AsyncState<T> {
    /// Work is in flight. `progress` is an optional completion fraction.
    Loading { progress: Option<f64> },
    /// The most recent computation produced a value.
    Data(T),
    /// The most recent computation failed with this message.
    Error(String),
}

impl<T> Default for AsyncState<T> {
    fn default() -> Self {
        Self::loading()
    }
}

impl<T> AsyncState<T> {
    /// `Loading` without progress information.
    #[must_use]
    pub const fn loading() -> Self {
        Self::Loading { progress: None }
    }

    /// `Loading` with a progress fraction, clamped to `[0.0, 1.0]`.
    ///
    /// A NaN progress is dropped.
    #[must_use]
    pub fn loading_with_progress(progress: f64) -> Self {
        Self::Loading {
            progress: clamp_progress(progress),
        }
    }

    /// `Error` with the given message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    #[must_use]
    pub const fn has_data(&self) -> bool {
        matches!(self, Self::Data(_))
    }

    #[must_use]
    pub const fn has_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The data, if this state holds any.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Data(value) => Some(value),
            _ => None,
        }
    }

    /// The failure message, if this state is an error.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Progress of a `Loading` state. `None` for every other variant.
    #[must_use]
    pub const fn progress(&self) -> Option<f64> {
        match self {
            Self::Loading { progress } => *progress,
            _ => None,
        }
    }

    /// Consume the state, keeping only the data.
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Data(value) => Some(value),
            _ => None,
        }
    }

    /// Borrow the payload without cloning it.
    #[must_use]
    pub fn as_ref(&self) -> AsyncState<&T> {
        match self {
            Self::Loading { progress } => AsyncState::Loading {
                progress: *progress,
            },
            Self::Data(value) => AsyncState::Data(value),
            Self::Error(message) => AsyncState::Error(message.clone()),
        }
    }

    /// Transform the data, leaving `Loading` and `Error` untouched.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AsyncState<U> {
        match self {
            Self::Loading { progress } => AsyncState::Loading { progress },
            Self::Data(value) => AsyncState::Data(f(value)),
            Self::Error(message) => AsyncState::Error(message),
        }
    }

    /// Exhaustive dispatch. The loading branch receives no payload; use
    /// [`when_with_progress`](Self::when_with_progress) when the progress
    /// fraction matters.
    pub fn when<R>(
        &self,
        loading: impl FnOnce() -> R,
        data: impl FnOnce(&T) -> R,
        error: impl FnOnce(&str) -> R,
    ) -> R {
        match self {
            Self::Loading { .. } => loading(),
            Self::Data(value) => data(value),
            Self::Error(message) => error(message),
        }
    }

    /// Exhaustive dispatch that hands the loading branch its progress.
    pub fn when_with_progress<R>(
        &self,
        loading: impl FnOnce(Option<f64>) -> R,
        data: impl FnOnce(&T) -> R,
        error: impl FnOnce(&str) -> R,
    ) -> R {
        match self {
            Self::Loading { progress } => loading(*progress),
            Self::Data(value) => data(value),
            Self::Error(message) => error(message),
        }
    }

    /// Partial dispatch: register only the handlers you need, then finish
    /// with [`MaybeWhen::or_else`], which runs for every unhandled variant.
    ///
    /// ```
    /// use statecraft_core::AsyncState;
    ///
    /// let state = AsyncState::Data(3);
    /// let label = state
    ///     .maybe_when()
    ///     .data(|v| format!("got {v}"))
    ///     .or_else(|| "pending".to_string());
    /// assert_eq!(label, "got 3");
    /// ```
    #[must_use]
    pub fn maybe_when<'a, R>(&'a self) -> MaybeWhen<'a, T, R> {
        MaybeWhen {
            state: self,
            loading: None,
            data: None,
            error: None,
        }
    }
}

/// Builder returned by [`AsyncState::maybe_when`].
#[must_use = "call `or_else` to run the dispatch"]
pub struct MaybeWhen<'a, T, R> {
    state: &'a AsyncState<T>,
    loading: Option<Box<dyn FnOnce(Option<f64>) -> R + 'a>>,
    data: Option<Box<dyn FnOnce(&T) -> R + 'a>>,
    error: Option<Box<dyn FnOnce(&str) -> R + 'a>>,
}

impl<'a, T, R> MaybeWhen<'a, T, R> {
    /// Handle `Loading`. The handler receives the progress fraction.
    pub fn loading(mut self, f: impl FnOnce(Option<f64>) -> R + 'a) -> Self {
        self.loading = Some(Box::new(f));
        self
    }

    /// Handle `Data`.
    pub fn data(mut self, f: impl FnOnce(&T) -> R + 'a) -> Self {
        self.data = Some(Box::new(f));
        self
    }

    /// Handle `Error`.
    pub fn error(mut self, f: impl FnOnce(&str) -> R + 'a) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    /// Run the matching handler, or `fallback` when none was registered.
    pub fn or_else(self, fallback: impl FnOnce() -> R) -> R {
        match self.state {
            AsyncState::Loading { progress } => match self.loading {
                Some(f) => f(*progress),
                None => fallback(),
            },
            AsyncState::Data(value) => match self.data {
                Some(f) => f(value),
                None => fallback(),
            },
            AsyncState::Error(message) => match self.error {
                Some(f) => f(message),
                None => fallback(),
            },
        }
    }
}

/// Clamp a progress fraction into `[0.0, 1.0]`. NaN yields `None`.
#[must_use]
pub fn clamp_progress(progress: f64) -> Option<f64> {
    if progress.is_nan() {
        None
    } else {
        Some(progress.clamp(0.0, 1.0))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
