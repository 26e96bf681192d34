// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Codec configuration

/// What the decoder does with a tag byte it does not recognize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownTokenPolicy {
    /// Drop the byte and keep decoding
    #[default]
    Skip,
    /// End the whole decode at the byte; later arguments are dropped
    Stop,
}

/// Decoder/encoder settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    pub unknown_tokens: UnknownTokenPolicy,
    /// Maximum set/label nesting the decoder descends into
    pub max_depth: usize,
    /// Write the string literals `true` / `false` as `T` / `F`
    pub normalize_logical_literals: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            unknown_tokens: UnknownTokenPolicy::Skip,
            max_depth: 64,
            normalize_logical_literals: true,
        }
    }
}

impl CodecConfig {
    /// Stop at unrecognized tags instead of skipping them
    pub fn strict() -> Self {
        Self {
            unknown_tokens: UnknownTokenPolicy::Stop,
            ..Self::default()
        }
    }

    pub fn with_unknown_tokens(mut self, policy: UnknownTokenPolicy) -> Self {
        self.unknown_tokens = policy;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_logical_literals(mut self, normalize: bool) -> Self {
        self.normalize_logical_literals = normalize;
        self
    }
}
