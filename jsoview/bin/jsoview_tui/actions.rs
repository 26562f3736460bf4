/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

/// Result of handling a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyResult {
    /// Nothing changed.
    None,
    /// The cursor moved; hover state follows the selected row.
    DetailChanged,
    /// A view setting changed; rows must be flattened again.
    NeedsRefresh,
}
