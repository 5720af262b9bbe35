//! Common imports from external crates.

pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
pub use glam::DVec3;
pub use indexmap::IndexSet;
pub use itertools::Itertools as _;
pub use log::{debug, error, info, warn};
pub use noisy_float::prelude::*;
pub use rand::{prelude::*, rngs::StdRng};
pub use serde::{Deserialize, Serialize};
pub use std::{
    f64::consts::PI,
    fmt,
    fmt::Debug,
    fs,
    io::Write as _,
    path::{Path, PathBuf},
};
