use serde::{Deserialize, Serialize};

/// Graph build options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
  /// Fail on a missing conversion or an ungroundable generic type. When
  /// false, the edge falls back to identity and the type stays generic.
  #[serde(default = "default_strict")]
  pub strict: bool,
}

fn default_strict() -> bool {
  true
}

impl Default for BuildOptions {
  fn default() -> Self {
    Self::strict()
  }
}

impl BuildOptions {
  pub fn strict() -> Self {
    Self { strict: true }
  }

  pub fn lenient() -> Self {
    Self { strict: false }
  }
}
