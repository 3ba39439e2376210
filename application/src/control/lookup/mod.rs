//! `User`s lookup control.

mod state;

use std::rc::Rc;

use derive_more::Debug;
use service::{
    domain::{user::email, User},
    infra::database,
    query::{self, users},
    read::user::list,
    Lookup, Query, Service,
};
use tokio::{sync::mpsc, task, time};
use tracerr::Traced;

use crate::AsError as _;

pub use self::state::{Effect, Msg, Nav, Request, Settings, State, Status};

/// Driver of a lookup control [`State`].
///
/// Performs the [`Effect`]s of the [`State`] transitions: runs the debounce
/// timer and the page fetches as local tasks, feeding their outcomes back as
/// [`Msg`]s.
#[derive(Debug)]
pub struct Control<Db> {
    /// [`Lookup`] fetching pages.
    lookup: Rc<Lookup<Db>>,

    /// Current [`State`].
    state: State,

    /// Local tasks of this [`Control`].
    tasks: task::LocalSet,

    /// Sender of [`Msg`]s produced by local tasks.
    tx: mpsc::UnboundedSender<Msg>,

    /// Receiver of [`Msg`]s produced by local tasks.
    rx: mpsc::UnboundedReceiver<Msg>,

    /// Pending debounce timer, if any.
    debounce: Option<task::JoinHandle<()>>,

    /// Callback receiving every confirmed change of the selection.
    #[debug(skip)]
    on_confirm: Box<dyn FnMut(&str)>,
}

impl<Db> Control<Db>
where
    Db: 'static,
    Service<Db>: Query<users::Select, Ok = Vec<User>, Err = Traced<database::Error>>
        + Query<
            users::TotalCount,
            Ok = list::TotalCount,
            Err = Traced<database::Error>,
        > + Query<users::ByIds, Ok = Vec<User>, Err = Traced<database::Error>>
        + Query<
            query::user::ById,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        >,
{
    /// Creates a new [`Control`] with its selection seeded from the provided
    /// `saved` field value, and requests the first page.
    pub fn new(
        lookup: Lookup<Db>,
        settings: Settings,
        saved: impl Into<email::Value>,
        on_confirm: impl FnMut(&str) + 'static,
    ) -> Self {
        let state = State::new(settings, lookup.page_size(), saved);
        let (tx, rx) = mpsc::unbounded_channel();
        let mut this = Self {
            lookup: Rc::new(lookup),
            state,
            tasks: task::LocalSet::new(),
            tx,
            rx,
            debounce: None,
            on_confirm: Box::new(on_confirm),
        };
        this.dispatch(Msg::Reload);
        this
    }

    /// Returns the current [`State`].
    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Applies the provided [`Msg`] and performs the resulting [`Effect`]s.
    pub fn dispatch(&mut self, msg: Msg) {
        for effect in self.state.update(msg) {
            self.perform(effect);
        }
    }

    /// Runs local tasks until one of them reports back, and applies its
    /// [`Msg`].
    ///
    /// Never resolves if nothing is pending.
    pub async fn next(&mut self) {
        if let Some(msg) = self.tasks.run_until(self.rx.recv()).await {
            self.dispatch(msg);
        }
    }

    /// Tears this [`Control`] down.
    ///
    /// The pending debounce timer is cancelled, and responses to requests
    /// still in flight are discarded.
    pub fn dispose(&mut self) {
        self.dispatch(Msg::Dispose);
    }

    /// Performs the provided [`Effect`].
    fn perform(&mut self, effect: Effect) {
        match effect {
            Effect::Debounce { generation, delay } => {
                self.cancel_debounce();
                let tx = self.tx.clone();
                self.debounce = Some(self.tasks.spawn_local(async move {
                    time::sleep(delay).await;
                    _ = tx.send(Msg::DebounceElapsed(generation));
                }));
            }
            Effect::CancelDebounce => self.cancel_debounce(),
            Effect::Fetch(req) => {
                if self.lookup.page_size() != req.page_size {
                    self.lookup.set_page_size(req.page_size);
                }
                if req.clear_cache {
                    self.lookup.clear_cache();
                }
                let lookup = Rc::clone(&self.lookup);
                let tx = self.tx.clone();
                drop(self.tasks.spawn_local(async move {
                    let result = lookup
                        .fetch_page(req.page, req.search.as_deref())
                        .await
                        .map_err(|e| e.into_error());
                    _ = tx.send(Msg::Loaded {
                        seq: req.seq,
                        result,
                    });
                }));
            }
            Effect::Confirm(value) => {
                tracing::info!(%value, "selection confirmed");
                (self.on_confirm)(&value);
            }
        }
    }

    /// Aborts the pending debounce timer, if any.
    fn cancel_debounce(&mut self) {
        if let Some(timer) = self.debounce.take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod spec {
    use std::{cell::RefCell, num::NonZeroUsize, rc::Rc, time::Duration};

    use service::{
        domain::{selection, User},
        infra::Memory,
        Config, Service,
    };
    use tokio::time;

    use super::{Control, Msg, Nav, Settings, Status};

    fn person(id: &str, first: &str) -> User {
        User {
            id: id.into(),
            first_name: first.to_owned(),
            last_name: "Doe".to_owned(),
            email: format!("{}@corp.io", first.to_lowercase()),
            disabled: Some(false),
            domain: Some("corp".to_owned()),
            title: Some("Clerk".to_owned()),
        }
    }

    fn store() -> Memory {
        Memory::new(
            [
                ("1", "Abby"),
                ("2", "Abe"),
                ("3", "Alan"),
                ("4", "Bob"),
                ("5", "Carl"),
                ("6", "Dana"),
                ("7", "Eve"),
            ]
            .map(|(id, first)| person(id, first)),
        )
    }

    fn control(db: &Memory, saved: &str) -> Control<Memory> {
        control_with(db, saved, |_| {})
    }

    fn control_with(
        db: &Memory,
        saved: &str,
        on_confirm: impl FnMut(&str) + 'static,
    ) -> Control<Memory> {
        Control::new(
            Service::new(Config::default(), db.clone()).lookup(),
            Settings {
                debounce: Duration::from_millis(500),
                mode: selection::Mode::Multi,
            },
            saved,
            on_confirm,
        )
    }

    fn names(control: &Control<Memory>) -> Vec<String> {
        control
            .state()
            .rows()
            .map(|(u, _)| u.first_name.clone())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn loads_first_page_on_start() {
        let db = store();
        let mut control = control(&db, "");
        assert!(matches!(control.state().status(), Status::Loading));

        control.next().await;
        assert!(matches!(control.state().status(), Status::Loaded));
        assert_eq!(names(&control), ["Abby", "Abe", "Alan", "Bob", "Carl"]);
        assert_eq!(control.state().info().unwrap().total_pages(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fires_single_request_for_debounced_search() {
        let db = store();
        let mut control = control(&db, "");
        control.next().await;
        let requests = db.requests();

        control.dispatch(Msg::Input("a".into()));
        control.dispatch(Msg::Input("ab".into()));
        control.next().await;
        assert!(matches!(control.state().status(), Status::Loading));
        control.next().await;

        assert_eq!(control.state().search(), Some("ab"));
        assert_eq!(names(&control), ["Abby", "Abe"]);
        // Count and page of the "ab" search only.
        assert_eq!(db.requests(), requests + 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_cancels_pending_search() {
        let db = store();
        let mut control = control(&db, "");
        control.next().await;
        let requests = db.requests();

        control.dispatch(Msg::Input("eve".into()));
        control.dispose();

        let res =
            time::timeout(Duration::from_secs(5), control.next()).await;
        assert!(res.is_err(), "nothing must report back");
        assert_eq!(db.requests(), requests);
        assert!(control.state().is_disposed());
    }

    #[tokio::test(start_paused = true)]
    async fn shows_failure_keeping_selection() {
        let db = store();
        let mut control = control(&db, "");
        control.next().await;
        control.dispatch(Msg::Toggle(1));

        db.set_available(false);
        control.dispatch(Msg::Navigate(Nav::Next));
        control.next().await;

        let message = control.state().message().unwrap();
        assert!(message.starts_with("failed to load users: "), "{message}");
        assert_eq!(control.state().selection().len(), 1);
        assert_eq!(names(&control).len(), 5);

        db.set_available(true);
        control.dispatch(Msg::Navigate(Nav::Next));
        control.next().await;
        assert_eq!(names(&control), ["Dana", "Eve"]);
    }

    #[tokio::test(start_paused = true)]
    async fn hands_confirmed_selection_to_host() {
        let confirmed = Rc::new(RefCell::new(Vec::new()));
        let db = store();
        let mut control = control_with(&db, "eve@corp.io", {
            let confirmed = Rc::clone(&confirmed);
            move |value| confirmed.borrow_mut().push(value.to_owned())
        });
        control.next().await;

        control.dispatch(Msg::Toggle(0));
        control.dispatch(Msg::Confirm);
        control.dispatch(Msg::Confirm);

        assert_eq!(*confirmed.borrow(), ["eve@corp.io;abby@corp.io"]);
    }

    #[tokio::test(start_paused = true)]
    async fn page_size_change_reaches_lookup() {
        let db = store();
        let mut control = control(&db, "");
        control.next().await;

        control.dispatch(Msg::SetPageSize(NonZeroUsize::new(3).unwrap()));
        control.next().await;
        assert_eq!(names(&control), ["Abby", "Abe", "Alan"]);
        assert_eq!(control.state().info().unwrap().total_pages(), 3);

        control.dispatch(Msg::Navigate(Nav::Last));
        control.next().await;
        assert_eq!(names(&control), ["Eve"]);
    }
}
