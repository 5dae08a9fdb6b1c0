#[cfg(feature = "core")]
#[doc(inline)]
pub use genfx_core as core;

#[cfg(feature = "overlaprs")]
#[doc(inline)]
pub use genfx_overlaprs as overlaprs;

#[cfg(feature = "realign")]
#[doc(inline)]
pub use genfx_realign as realign;

#[cfg(feature = "effect")]
#[doc(inline)]
pub use genfx_effect as effect;

#[cfg(feature = "hgvs")]
#[doc(inline)]
pub use genfx_hgvs as hgvs;

#[cfg(feature = "hgvs")]
pub mod batch;
