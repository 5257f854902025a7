// Application layer - Use case interactors

pub mod batch_interactor;
pub mod container;
pub mod inspect_interactor;
pub mod shorts_interactor;

// Re-export interactors
pub use batch_interactor::{BatchInteractor, BatchItem, BatchReport};
pub use container::{AppContainer, DefaultAppContainer};
pub use inspect_interactor::InspectInteractor;
pub use shorts_interactor::ShortsInteractor;
