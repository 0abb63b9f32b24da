mod gallery_observer_port;
mod http_transport_port;
mod persistent_cache_port;

pub use gallery_observer_port::{GalleryEvent, GalleryObserver};
pub use http_transport_port::{HttpResponse, HttpTransport, TransportError};
pub use persistent_cache_port::PersistentCachePort;

#[cfg(test)]
pub use http_transport_port::MockHttpTransport;

#[cfg(test)]
pub mod mocks {
    pub use super::gallery_observer_port::mock::RecordingObserver;
    pub use super::http_transport_port::mock::StubTransport;
    pub use super::persistent_cache_port::mock::MapPersistentCache;
}
