use thiserror::Error;

use genfx_effect::EffectError;

#[derive(Error, Debug)]
pub enum HgvsError {
    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error("Cannot serialize annotation: {0}")]
    Json(#[from] serde_json::Error),
}

pub type HgvsResult<T> = std::result::Result<T, HgvsError>;
