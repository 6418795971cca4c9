// Sticker list canonicalization

use std::collections::HashMap;

use crate::entities::Sticker;

/// Annotates repeated stickers and collapses an empty list to `None`.
///
/// For every `sticker_id` appearing more than once, the first sticker of the
/// group gets `duplicates = group size`. A group that already has a member
/// with `duplicates > 1` is left alone, so canonical input comes back
/// unchanged.
pub fn canonicalize_stickers<I>(stickers: I) -> Option<Vec<Sticker>>
where
    I: IntoIterator,
    I::Item: Into<Sticker>,
{
    let mut stickers: Vec<Sticker> = stickers.into_iter().map(Into::into).collect();
    if stickers.is_empty() {
        return None;
    }

    let mut groups: HashMap<u32, (usize, bool)> = HashMap::new();
    for sticker in &stickers {
        let entry = groups.entry(sticker.sticker_id).or_insert((0, false));
        entry.0 += 1;
        entry.1 |= sticker.duplicates.is_some_and(|count| count > 1);
    }

    for sticker in &mut stickers {
        let Some((size, annotated)) = groups.get_mut(&sticker.sticker_id) else {
            continue;
        };
        if *size > 1 && !*annotated {
            sticker.duplicates = Some(u32::try_from(*size).unwrap_or(u32::MAX));
            *annotated = true;
        }
    }

    Some(stickers)
}
