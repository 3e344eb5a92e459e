use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::dispatch::{AnyDispatcher, Dispatcher};
use crate::subscription::Subscription;
use crate::view_model::{UserCellViewModel, UserListViewModel};

/// Something that shows a list of rows.
pub trait ListView: Send {
    fn reload(&mut self, rows: &[String]);
}

/// Keeps a [`ListView`] in sync with a [`UserListViewModel`].
///
/// Every change of the rows, starting with the value present at attach
/// time, is turned into a reload job handed to the dispatcher. The view is
/// held weakly: once its owner drops it, jobs become no-ops.
pub struct UserListPresenter {
    subscription: Subscription<Vec<UserCellViewModel>>,
}

impl UserListPresenter {
    pub fn attach<V, D>(view_model: &UserListViewModel, view: &Arc<Mutex<V>>, dispatcher: D) -> Self
    where
        V: ListView + 'static,
        D: Dispatcher + 'static,
    {
        let dispatcher = AnyDispatcher::new(Box::new(dispatcher));
        let view: Weak<Mutex<V>> = Arc::downgrade(view);

        let subscription = view_model
            .users()
            .bind_scoped(move |cells: &Vec<UserCellViewModel>| {
                let rows: Vec<String> = cells.iter().map(|cell| cell.name.clone()).collect();
                let view = view.clone();
                dispatcher.dispatch(Box::new(move || match view.upgrade() {
                    Some(view) => view.lock().reload(&rows),
                    None => log::trace!("list view released, skipping reload"),
                }));
            });

        Self { subscription }
    }

    /// Stops forwarding changes. Jobs already dispatched still run.
    pub fn detach(self) {
        self.subscription.unsubscribe();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dispatch::ImmediateDispatcher;
    use crate::source::StaticSource;
    use crate::ui_queue::UiQueue;

    const USERS: &str = r#"[{"name": "Leanne Graham"}, {"name": "Ervin Howell"}]"#;

    #[derive(Default)]
    struct RecordingView {
        renders: Vec<Vec<String>>,
    }

    impl ListView for RecordingView {
        fn reload(&mut self, rows: &[String]) {
            self.renders.push(rows.to_vec());
        }
    }

    #[tokio::test]
    async fn test_renders_on_attach_and_on_load() {
        let view_model = UserListViewModel::new();
        let view = Arc::new(Mutex::new(RecordingView::default()));
        let _presenter = UserListPresenter::attach(&view_model, &view, ImmediateDispatcher);

        view_model.load(&StaticSource::new(USERS)).await.unwrap();

        assert_eq!(
            view.lock().renders,
            vec![
                vec![],
                vec!["Leanne Graham".to_string(), "Ervin Howell".to_string()],
            ]
        );
    }

    #[tokio::test]
    async fn test_reloads_wait_for_ui_queue() {
        let (dispatcher, queue) = UiQueue::new();
        let view_model = UserListViewModel::new();
        let view = Arc::new(Mutex::new(RecordingView::default()));
        let _presenter = UserListPresenter::attach(&view_model, &view, dispatcher);

        view_model.load(&StaticSource::new(USERS)).await.unwrap();
        assert!(view.lock().renders.is_empty());

        assert_eq!(queue.run_until_idle(), 2);
        assert_eq!(view.lock().renders.len(), 2);
        assert_eq!(view.lock().renders[1].len(), 2);
    }

    #[test]
    fn test_detach_stops_reloads() {
        let view_model = UserListViewModel::new();
        let view = Arc::new(Mutex::new(RecordingView::default()));
        let presenter = UserListPresenter::attach(&view_model, &view, ImmediateDispatcher);

        presenter.detach();
        view_model.users().set(vec![UserCellViewModel {
            name: "Clementine Bauch".into(),
        }]);

        assert_eq!(view.lock().renders.len(), 1);
        assert_eq!(view_model.users().listener_count(), 0);
    }

    #[test]
    fn test_released_view_is_skipped() {
        let (dispatcher, queue) = UiQueue::new();
        let view_model = UserListViewModel::new();
        let view = Arc::new(Mutex::new(RecordingView::default()));
        let _presenter = UserListPresenter::attach(&view_model, &view, dispatcher);

        drop(view);
        view_model.users().set(Vec::new());

        assert_eq!(queue.run_until_idle(), 2);
    }
}
