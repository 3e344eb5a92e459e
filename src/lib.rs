mod dispatch;
mod listener;
mod model;
mod observable;
mod policy;
mod presenter;
mod source;
mod subscription;
mod ui_queue;
mod view_model;

pub use dispatch::{AnyDispatcher, Dispatcher, ImmediateDispatcher, Job};
pub use listener::ListenerId;
pub use model::{decode_users, User};
pub use observable::Observable;
pub use policy::FailurePolicy;
pub use presenter::{ListView, UserListPresenter};
pub use source::{StaticSource, UserSource};
pub use subscription::Subscription;
pub use ui_queue::{QueueDispatcher, UiQueue};
pub use view_model::{UserCellViewModel, UserListViewModel};
