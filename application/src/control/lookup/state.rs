//! [`State`] machine of a `User`s lookup control.

use std::{num::NonZeroUsize, time};

use service::{
    domain::{
        selection::{self, Selection},
        user::email,
        User,
    },
    read::user::list,
};

use crate::Error;

/// Loading status of a [`State`].
#[derive(Clone, Debug)]
pub enum Status {
    /// Nothing has been requested yet.
    Idle,

    /// The latest requested page hasn't arrived yet.
    Loading,

    /// The latest requested page is shown.
    Loaded,

    /// The latest requested page failed to load.
    Failed(Error),
}

/// Page navigation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Nav {
    /// To the first page.
    First,

    /// To the page before the current one.
    Previous,

    /// To the page after the current one.
    Next,

    /// To the last page.
    Last,

    /// To the page with the provided number.
    To(usize),
}

/// Input of a [`State`].
#[derive(Clone, Debug)]
pub enum Msg {
    /// Text of the search box has changed.
    Input(String),

    /// Debounce timer of the provided generation has elapsed.
    DebounceElapsed(u64),

    /// Page navigation is requested.
    Navigate(Nav),

    /// Current page reload is requested.
    Reload,

    /// Search is reset and the first page reloaded.
    ShowAll,

    /// Page size has changed.
    SetPageSize(NonZeroUsize),

    /// Response to the request with the provided sequence number.
    Loaded {
        /// Sequence number of the request.
        seq: u64,

        /// Fetched page or the failure.
        result: Result<list::Page, Error>,
    },

    /// Row with the provided index of the current page is clicked.
    Toggle(usize),

    /// Current [`Selection`] is confirmed.
    Confirm,

    /// Control is torn down.
    Dispose,
}

/// Page request issued by a [`State`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Request {
    /// Sequence number of this [`Request`].
    pub seq: u64,

    /// Requested page number.
    pub page: usize,

    /// Search term, if any.
    pub search: Option<String>,

    /// Page size to request with.
    pub page_size: NonZeroUsize,

    /// Indicator whether remembered page ends must be forgotten first.
    pub clear_cache: bool,
}

/// Side effect requested by a [`State`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Effect {
    /// (Re)start the debounce timer, replacing any pending one.
    Debounce {
        /// Generation to report in [`Msg::DebounceElapsed`].
        generation: u64,

        /// Timer duration.
        delay: time::Duration,
    },

    /// Cancel the pending debounce timer.
    CancelDebounce,

    /// Fetch a page, reporting it in [`Msg::Loaded`].
    Fetch(Request),

    /// Hand the serialized [`Selection`] over to the host.
    Confirm(String),
}

/// Settings of a [`State`].
#[derive(Clone, Copy, Debug)]
pub struct Settings {
    /// Pause in typing after which a search is performed.
    pub debounce: time::Duration,

    /// [`selection::Mode`] of the control.
    pub mode: selection::Mode,
}

/// State of a `User`s lookup control.
///
/// Knows nothing about timers or stores: every transition returns the
/// [`Effect`]s to be performed by its driver.
#[derive(Debug)]
pub struct State {
    /// [`Settings`] of this [`State`].
    settings: Settings,

    /// Current text of the search box.
    input: String,

    /// Search term of the shown listing.
    search: Option<String>,

    /// Current page size.
    page_size: NonZeroUsize,

    /// Shown page of `User`s.
    users: Vec<User>,

    /// [`list::PageInfo`] of the shown page, if any was loaded.
    info: Option<list::PageInfo>,

    /// Picked `User`s.
    selection: Selection,

    /// Last value handed over to the host.
    confirmed: String,

    /// Loading [`Status`].
    status: Status,

    /// Sequence number of the latest issued [`Request`].
    seq: u64,

    /// Generation of the latest debounce timer.
    generation: u64,

    /// Indicator whether the control is torn down.
    disposed: bool,
}

impl State {
    /// Creates a new [`State`] seeding its [`Selection`] from the provided
    /// saved field value.
    #[must_use]
    pub fn new(
        settings: Settings,
        page_size: NonZeroUsize,
        saved: impl Into<email::Value>,
    ) -> Self {
        let selection = Selection::seed(settings.mode, saved);
        Self {
            settings,
            input: String::new(),
            search: None,
            page_size,
            users: Vec::new(),
            info: None,
            confirmed: selection.serialize(),
            selection,
            status: Status::Idle,
            seq: 0,
            generation: 0,
            disposed: false,
        }
    }

    /// Returns the current text of the search box.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Returns the search term of the shown listing, if any.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Returns [`list::PageInfo`] of the shown page, if any was loaded.
    #[must_use]
    pub fn info(&self) -> Option<list::PageInfo> {
        self.info
    }

    /// Returns the current page size.
    #[must_use]
    pub fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    /// Returns the loading [`Status`].
    #[must_use]
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Returns the message to show for a failed load, if any.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match &self.status {
            Status::Failed(e) => {
                Some(format!("failed to load users: {}", e.message))
            }
            Status::Idle | Status::Loading | Status::Loaded => None,
        }
    }

    /// Returns the picked `User`s.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Returns `User`s of the shown page along with their highlighting.
    pub fn rows(&self) -> impl Iterator<Item = (&User, bool)> {
        self.users
            .iter()
            .map(|u| (u, self.selection.is_selected(u)))
    }

    /// Indicates whether the control is torn down.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Applies the provided [`Msg`], returning [`Effect`]s to perform.
    ///
    /// Every [`Msg`] is ignored once [`Msg::Dispose`] is applied.
    pub fn update(&mut self, msg: Msg) -> Vec<Effect> {
        if self.disposed {
            tracing::debug!(?msg, "ignoring `Msg` of disposed control");
            return Vec::new();
        }
        match msg {
            Msg::Input(text) => {
                self.input = text;
                self.generation += 1;
                vec![Effect::Debounce {
                    generation: self.generation,
                    delay: self.settings.debounce,
                }]
            }
            Msg::DebounceElapsed(generation) => {
                if generation != self.generation {
                    return Vec::new();
                }
                let search = list::Filter::new(Some(self.input.as_str())).search;
                let clear_cache = search != self.search;
                if clear_cache {
                    self.info = None;
                }
                self.search = search;
                vec![self.fetch(1, clear_cache)]
            }
            Msg::Navigate(nav) => self
                .target(nav)
                .map(|page| self.fetch(page, false))
                .into_iter()
                .collect(),
            Msg::Reload => {
                let page = self.info.map_or(1, |i| i.page);
                vec![self.fetch(page, true)]
            }
            Msg::ShowAll => {
                self.input.clear();
                if self.search.take().is_some() {
                    self.info = None;
                }
                self.generation += 1;
                vec![Effect::CancelDebounce, self.fetch(1, true)]
            }
            Msg::SetPageSize(size) => {
                if self.page_size != size {
                    self.info = None;
                }
                self.page_size = size;
                vec![self.fetch(1, true)]
            }
            Msg::Loaded { seq, result } => {
                self.loaded(seq, result);
                Vec::new()
            }
            Msg::Toggle(row) => {
                if let Some(user) = self.users.get(row) {
                    _ = self.selection.toggle(user.clone());
                }
                Vec::new()
            }
            Msg::Confirm => {
                let value = self.selection.serialize();
                if value == self.confirmed {
                    return Vec::new();
                }
                self.confirmed.clone_from(&value);
                vec![Effect::Confirm(value)]
            }
            Msg::Dispose => {
                self.disposed = true;
                vec![Effect::CancelDebounce]
            }
        }
    }

    /// Issues a new [`Request`] for the provided `page`.
    fn fetch(&mut self, page: usize, clear_cache: bool) -> Effect {
        self.seq += 1;
        self.status = Status::Loading;
        Effect::Fetch(Request {
            seq: self.seq,
            page,
            search: self.search.clone(),
            page_size: self.page_size,
            clear_cache,
        })
    }

    /// Resolves the page number the provided [`Nav`] leads to, if it exists
    /// and differs from the shown one.
    fn target(&self, nav: Nav) -> Option<usize> {
        let Some(info) = self.info else {
            return (nav == Nav::First).then_some(1);
        };
        let page = match nav {
            Nav::First => 1,
            Nav::Previous if info.has_previous_page() => info.page - 1,
            Nav::Next if info.has_next_page() => info.page + 1,
            Nav::Last => info.total_pages().max(1),
            Nav::To(page) if info.is_reachable(page) => page,
            Nav::Previous | Nav::Next | Nav::To(_) => return None,
        };
        (page != info.page).then_some(page)
    }

    /// Applies the response to the [`Request`] with the provided `seq`uence
    /// number, unless a later [`Request`] was issued.
    fn loaded(&mut self, seq: u64, result: Result<list::Page, Error>) {
        if seq != self.seq {
            tracing::debug!(seq, latest = self.seq, "discarding stale page");
            return;
        }
        match result {
            Ok(page) => {
                self.selection.refresh(&page.items);
                self.info = Some(page.info);
                self.users = page.items;
                self.status = Status::Loaded;
            }
            Err(e) => {
                tracing::warn!("failed to load users: {e}");
                self.status = Status::Failed(e);
            }
        }
    }
}
