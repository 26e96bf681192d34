// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inverse reference scanner
//!
//! Finds the lines whose argument at a fixed position refers to a target
//! line. The argument may be a single reference or a set that contains one
//! (nested sets included). Candidates come from a list of type codes and are
//! visited type by type, each type's lines in index order.

use rustc_hash::FxHashSet;

use crate::cursor::TokenCursor;
use crate::token::TokenKind;

/// Scan candidate lines for references to `target` at argument `position`.
///
/// With `collect_all` false the scan stops at the first match and returns
/// at most one id. Candidates that cannot be positioned (missing line or
/// too few arguments) are skipped.
pub fn find_referencing<C>(
    cursor: &mut C,
    target: u32,
    candidate_types: &[u32],
    position: usize,
    collect_all: bool,
) -> Vec<u32>
where
    C: TokenCursor + ?Sized,
{
    let mut found = Vec::new();
    let mut seen_types = FxHashSet::default();

    for &type_code in candidate_types {
        if !seen_types.insert(type_code) {
            continue;
        }
        for candidate in cursor.ids_with_type(type_code) {
            if !references_at(cursor, candidate, position, target) {
                continue;
            }
            found.push(candidate);
            if !collect_all {
                return found;
            }
        }
    }

    tracing::debug!(
        target_id = target,
        position,
        matches = found.len(),
        "Inverse scan finished"
    );
    found
}

/// True if argument `position` of `candidate` is, or contains, `#target`
fn references_at<C: TokenCursor + ?Sized>(
    cursor: &mut C,
    candidate: u32,
    position: usize,
    target: u32,
) -> bool {
    if cursor.move_to_argument(candidate, position).is_err() {
        return false;
    }
    match cursor.token_kind() {
        Some(TokenKind::Reference) => {
            cursor.step_back();
            cursor.read_reference().is_ok_and(|id| id == target)
        }
        Some(TokenKind::SetBegin) => set_contains(cursor, target),
        _ => false,
    }
}

/// Walk a set run (SetBegin already consumed) looking for `#target`
fn set_contains<C: TokenCursor + ?Sized>(cursor: &mut C, target: u32) -> bool {
    let mut depth = 1usize;
    while depth > 0 && !cursor.is_at_end() {
        match cursor.token_kind() {
            Some(TokenKind::SetBegin) => depth += 1,
            Some(TokenKind::SetEnd) => depth -= 1,
            Some(TokenKind::LineEnd) => return false,
            Some(TokenKind::Reference) => {
                cursor.step_back();
                match cursor.read_reference() {
                    Ok(id) if id == target => return true,
                    Ok(_) => {}
                    Err(_) => return false,
                }
            }
            Some(_) => {
                cursor.step_back();
                if cursor.skip_token().is_err() {
                    return false;
                }
            }
            None => {}
        }
    }
    false
}
