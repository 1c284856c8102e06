//! Sparse note storage addressed by `(tick, layer)` cells, plus ordered layer metadata.
//!
//! Layer indices are programmer contracts and fail with [`GridError::IndexOutOfRange`];
//! geometry (regions, move deltas) is user input and is clamped instead.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use crate::note::{Layer, Note};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Layer index {index} out of range (layer count {len})")]
    IndexOutOfRange { index: u32, len: usize },

    #[error("No layer row left above tick {tick}: a note already sits on the last row")]
    LayerOverflow { tick: u32 },
}

/// Closed rectangle of grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    tick_start: u32,
    tick_end: u32,
    layer_start: u32,
    layer_end: u32,
}

impl Region {
    /// A region with `start > end` on either axis is empty.
    pub fn new(ticks: RangeInclusive<u32>, layers: RangeInclusive<u32>) -> Self {
        Self {
            tick_start: *ticks.start(),
            tick_end: *ticks.end(),
            layer_start: *layers.start(),
            layer_end: *layers.end(),
        }
    }

    pub fn cell(tick: u32, layer: u32) -> Self {
        Self::new(tick..=tick, layer..=layer)
    }

    /// Region spanned by two `(tick, layer)` corners in any order, as produced by
    /// a rubber-band drag. Parts left of tick 0 or above layer 0 are cut off;
    /// returns `None` when nothing of the rectangle lies on the grid.
    pub fn from_corners(a: (i64, i64), b: (i64, i64)) -> Option<Self> {
        let (tick_start, tick_end) = clamp_axis(a.0, b.0)?;
        let (layer_start, layer_end) = clamp_axis(a.1, b.1)?;
        Some(Self {
            tick_start,
            tick_end,
            layer_start,
            layer_end,
        })
    }

    pub fn contains(&self, tick: u32, layer: u32) -> bool {
        (self.tick_start..=self.tick_end).contains(&tick)
            && (self.layer_start..=self.layer_end).contains(&layer)
    }

    pub fn is_empty(&self) -> bool {
        self.tick_start > self.tick_end || self.layer_start > self.layer_end
    }

    pub fn ticks(&self) -> RangeInclusive<u32> {
        self.tick_start..=self.tick_end
    }

    pub fn layers(&self) -> RangeInclusive<u32> {
        self.layer_start..=self.layer_end
    }
}

fn clamp_axis(a: i64, b: i64) -> Option<(u32, u32)> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if hi < 0 || lo > u32::MAX as i64 {
        return None;
    }
    let lo = lo.max(0) as u32;
    let hi = hi.min(u32::MAX as i64) as u32;
    Some((lo, hi))
}

/// Result of [`NoteGrid::move_selected`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Tick delta actually applied (0 if the axis was suppressed).
    pub delta_tick: i64,
    /// Layer delta actually applied (0 if the axis was suppressed).
    pub delta_layer: i64,
    /// Unselected notes overwritten by the moved ones.
    pub displaced: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    note: Note,
    selected: bool,
}

/// Note storage with at most one note per `(tick, layer)` cell.
///
/// Layer metadata is an ordered list that is only grown explicitly through
/// [`insert_layer`](Self::insert_layer); inserting a note on a layer without
/// metadata grows [`height`](Self::height) but creates no [`Layer`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteGrid {
    notes: HashMap<(u32, u32), Slot>,
    layers: Vec<Layer>,
}

impl NoteGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layers(layers: Vec<Layer>) -> Self {
        Self {
            notes: HashMap::new(),
            layers,
        }
    }

    /// Place `note` at `(tick, layer)`, returning the note it replaced.
    /// The new occupant starts unselected.
    pub fn insert_note(&mut self, tick: u32, layer: u32, mut note: Note) -> Option<Note> {
        note.tick = tick;
        note.layer = layer;
        self.notes
            .insert(
                (tick, layer),
                Slot {
                    note,
                    selected: false,
                },
            )
            .map(|slot| slot.note)
    }

    /// Place `note` at the cell named by its own `tick` and `layer`.
    pub fn insert(&mut self, note: Note) -> Option<Note> {
        self.insert_note(note.tick, note.layer, note)
    }

    pub fn remove_note(&mut self, tick: u32, layer: u32) -> Option<Note> {
        self.notes.remove(&(tick, layer)).map(|slot| slot.note)
    }

    pub fn note_at(&self, tick: u32, layer: u32) -> Option<&Note> {
        self.notes.get(&(tick, layer)).map(|slot| &slot.note)
    }

    /// Notes inside `region`, ordered by tick then layer.
    pub fn notes_in_region(&self, region: &Region) -> Vec<&Note> {
        self.collect_sorted(|&(tick, layer), _| region.contains(tick, layer))
    }

    /// Notes sounding at `tick`, in layer order.
    pub fn notes_at_tick(&self, tick: u32) -> Vec<&Note> {
        self.collect_sorted(|&(t, _), _| t == tick)
    }

    /// Every note, ordered by tick then layer.
    pub fn notes(&self) -> Vec<&Note> {
        self.collect_sorted(|_, _| true)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn last_tick(&self) -> Option<u32> {
        self.notes.keys().map(|&(tick, _)| tick).max()
    }

    /// Number of rows in use: the layer metadata count or one past the highest
    /// occupied layer, whichever is larger.
    pub fn height(&self) -> u32 {
        let occupied = self
            .notes
            .keys()
            .map(|&(_, layer)| layer.saturating_add(1))
            .max()
            .unwrap_or(0);
        occupied.max(self.layers.len() as u32)
    }

    /// Remove all notes and layers.
    pub fn clear(&mut self) {
        self.notes.clear();
        self.layers.clear();
    }

    // Selection

    /// Set the selection flag of every note in `region`. Returns how many notes matched.
    pub fn select_region(&mut self, region: &Region, selected: bool) -> usize {
        let mut count = 0;
        for (&(tick, layer), slot) in self.notes.iter_mut() {
            if region.contains(tick, layer) {
                slot.selected = selected;
                count += 1;
            }
        }
        count
    }

    pub fn select_all(&mut self) {
        self.notes.values_mut().for_each(|slot| slot.selected = true);
    }

    pub fn deselect_all(&mut self) {
        self.notes.values_mut().for_each(|slot| slot.selected = false);
    }

    pub fn invert_selection(&mut self) {
        self.notes
            .values_mut()
            .for_each(|slot| slot.selected = !slot.selected);
    }

    pub fn is_selected(&self, tick: u32, layer: u32) -> bool {
        self.notes
            .get(&(tick, layer))
            .is_some_and(|slot| slot.selected)
    }

    pub fn selected_notes(&self) -> Vec<&Note> {
        self.collect_sorted(|_, slot| slot.selected)
    }

    pub fn selected_count(&self) -> usize {
        self.notes.values().filter(|slot| slot.selected).count()
    }

    /// Delete the selection, returning the removed notes ordered by tick then layer.
    pub fn remove_selected(&mut self) -> Vec<Note> {
        let mut removed: Vec<Note> = Vec::new();
        self.notes.retain(|_, slot| {
            if slot.selected {
                removed.push(slot.note);
            }
            !slot.selected
        });
        removed.sort_by_key(|note| (note.tick, note.layer));
        removed
    }

    /// Translate every selected note by the given deltas.
    ///
    /// Each axis is all-or-nothing: if any selected note would leave the grid on
    /// that axis, the whole selection keeps its position on it. Moved notes stay
    /// selected and replace unselected notes at their destination.
    pub fn move_selected(&mut self, delta_tick: i64, delta_layer: i64) -> MoveOutcome {
        let selected: Vec<(u32, u32)> = self
            .notes
            .iter()
            .filter(|(_, slot)| slot.selected)
            .map(|(&cell, _)| cell)
            .collect();

        let delta_tick = if selected.iter().all(|&(tick, _)| shift(tick, delta_tick).is_some()) {
            delta_tick
        } else {
            0
        };
        let delta_layer = if selected
            .iter()
            .all(|&(_, layer)| shift(layer, delta_layer).is_some())
        {
            delta_layer
        } else {
            0
        };

        let mut outcome = MoveOutcome {
            delta_tick,
            delta_layer,
            displaced: Vec::new(),
        };
        if selected.is_empty() || (delta_tick == 0 && delta_layer == 0) {
            return outcome;
        }

        let moving: Vec<Slot> = selected
            .iter()
            .filter_map(|cell| self.notes.remove(cell))
            .collect();

        for mut slot in moving {
            let tick = shift(slot.note.tick, delta_tick).unwrap_or(slot.note.tick);
            let layer = shift(slot.note.layer, delta_layer).unwrap_or(slot.note.layer);
            slot.note.tick = tick;
            slot.note.layer = layer;
            if let Some(previous) = self.notes.insert((tick, layer), slot) {
                outcome.displaced.push(previous.note);
            }
        }
        outcome.displaced.sort_by_key(|note| (note.tick, note.layer));
        outcome
    }

    // Layers

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, index: u32) -> Result<&Layer, GridError> {
        let idx = self.check_layer(index)?;
        Ok(&self.layers[idx])
    }

    /// Insert layer metadata at `index`, moving every note on `index` or above up one row.
    ///
    /// `index` may be at most [`layer_count`](Self::layer_count), the same positions
    /// [`remove_layer`](Self::remove_layer) accepts once the layer is in place.
    /// Fails without touching the grid if a note on the last representable row
    /// would have to move.
    pub fn insert_layer(&mut self, index: u32, layer: Layer) -> Result<(), GridError> {
        let idx = index as usize;
        if idx > self.layers.len() {
            return Err(GridError::IndexOutOfRange {
                index,
                len: self.layers.len(),
            });
        }
        if let Some(&(tick, _)) = self.notes.keys().find(|&&(_, l)| l == u32::MAX) {
            return Err(GridError::LayerOverflow { tick });
        }

        self.layers.insert(idx, layer);
        self.remap_layers(|l| Some(if l >= index { l + 1 } else { l }));

        tracing::debug!(index, layers = self.layers.len(), "layer inserted");
        Ok(())
    }

    /// Remove the layer at `index` together with its notes; higher rows move down one.
    pub fn remove_layer(&mut self, index: u32) -> Result<Layer, GridError> {
        let idx = self.check_layer(index)?;
        let removed = self.layers.remove(idx);
        self.remap_layers(|l| match l.cmp(&index) {
            std::cmp::Ordering::Less => Some(l),
            std::cmp::Ordering::Equal => None,
            std::cmp::Ordering::Greater => Some(l - 1),
        });

        tracing::debug!(index, layers = self.layers.len(), "layer removed");
        Ok(removed)
    }

    /// Exchange two layers' metadata and notes.
    pub fn swap_layers(&mut self, a: u32, b: u32) -> Result<(), GridError> {
        let ia = self.check_layer(a)?;
        let ib = self.check_layer(b)?;
        if ia == ib {
            return Ok(());
        }
        self.layers.swap(ia, ib);
        self.remap_layers(|l| {
            Some(if l == a {
                b
            } else if l == b {
                a
            } else {
                l
            })
        });
        Ok(())
    }

    pub fn set_layer_name(&mut self, index: u32, name: impl Into<String>) -> Result<(), GridError> {
        self.layer_mut(index)?.name = name.into();
        Ok(())
    }

    /// Volume is capped at 100.
    pub fn set_layer_volume(&mut self, index: u32, volume: u8) -> Result<(), GridError> {
        self.layer_mut(index)?.volume = volume.min(100);
        Ok(())
    }

    /// Panning is clamped to -100..=100.
    pub fn set_layer_panning(&mut self, index: u32, panning: i8) -> Result<(), GridError> {
        self.layer_mut(index)?.panning = panning.clamp(-100, 100);
        Ok(())
    }

    pub fn set_layer_locked(&mut self, index: u32, locked: bool) -> Result<(), GridError> {
        self.layer_mut(index)?.locked = locked;
        Ok(())
    }

    pub fn set_layer_solo(&mut self, index: u32, solo: bool) -> Result<(), GridError> {
        self.layer_mut(index)?.solo = solo;
        Ok(())
    }

    fn layer_mut(&mut self, index: u32) -> Result<&mut Layer, GridError> {
        let idx = self.check_layer(index)?;
        Ok(&mut self.layers[idx])
    }

    fn check_layer(&self, index: u32) -> Result<usize, GridError> {
        let idx = index as usize;
        if idx < self.layers.len() {
            Ok(idx)
        } else {
            Err(GridError::IndexOutOfRange {
                index,
                len: self.layers.len(),
            })
        }
    }

    /// Rebuild the cell map with every note's layer passed through `map`;
    /// notes mapped to `None` are dropped.
    fn remap_layers(&mut self, map: impl Fn(u32) -> Option<u32>) {
        let notes = std::mem::take(&mut self.notes);
        self.notes = notes
            .into_iter()
            .filter_map(|((tick, layer), mut slot)| {
                let layer = map(layer)?;
                slot.note.layer = layer;
                Some(((tick, layer), slot))
            })
            .collect();
    }

    fn collect_sorted(&self, keep: impl Fn(&(u32, u32), &Slot) -> bool) -> Vec<&Note> {
        let mut cells: Vec<(&(u32, u32), &Slot)> =
            self.notes.iter().filter(|(cell, slot)| keep(*cell, *slot)).collect();
        cells.sort_by_key(|(cell, _)| **cell);
        cells.into_iter().map(|(_, slot)| &slot.note).collect()
    }
}

fn shift(value: u32, delta: i64) -> Option<u32> {
    u32::try_from(value as i64 + delta).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(key: u8) -> Note {
        Note::new(0, key)
    }

    fn layers(count: usize) -> Vec<Layer> {
        (0..count).map(|i| Layer::new(format!("Layer {}", i + 1))).collect()
    }

    fn keys(notes: &[&Note]) -> Vec<u8> {
        notes.iter().map(|n| n.key).collect()
    }

    #[test]
    fn test_single_occupancy() {
        let mut grid = NoteGrid::new();

        assert_eq!(grid.insert_note(4, 2, note(30)), None);
        let replaced = grid.insert_note(4, 2, note(31));
        grid.insert_note(4, 2, note(32));

        assert_eq!(replaced.map(|n| n.key), Some(30));
        assert_eq!(grid.note_at(4, 2).map(|n| n.key), Some(32));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_insert_sets_position() {
        let mut grid = NoteGrid::new();
        grid.insert_note(7, 1, note(40).at(99, 99));

        let stored = grid.note_at(7, 1).expect("note");
        assert_eq!((stored.tick, stored.layer), (7, 1));
    }

    #[test]
    fn test_insert_note_does_not_create_layers() {
        let mut grid = NoteGrid::new();
        grid.insert_note(0, 5, note(40));

        assert_eq!(grid.layer_count(), 0);
        assert_eq!(grid.height(), 6);
        assert!(grid.layer(5).is_err());
    }

    #[test]
    fn test_remove_note() {
        let mut grid = NoteGrid::new();
        grid.insert_note(1, 1, note(40));

        assert_eq!(grid.remove_note(1, 1).map(|n| n.key), Some(40));
        assert_eq!(grid.remove_note(1, 1), None);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_notes_in_region_is_ordered() {
        let mut grid = NoteGrid::new();
        grid.insert_note(5, 0, note(1));
        grid.insert_note(2, 3, note(2));
        grid.insert_note(2, 1, note(3));
        grid.insert_note(9, 1, note(4));

        let found = grid.notes_in_region(&Region::new(2..=5, 0..=3));

        assert_eq!(keys(&found), vec![3, 2, 1]);
    }

    #[test]
    fn test_empty_region() {
        let mut grid = NoteGrid::new();
        grid.insert_note(3, 3, note(1));

        let region = Region::new(5..=2, 0..=10);
        assert!(region.is_empty());
        assert!(grid.notes_in_region(&region).is_empty());
    }

    #[test]
    fn test_region_from_corners() {
        let region = Region::from_corners((10, 4), (-3, 1)).expect("on grid");
        assert_eq!(region.ticks(), 0..=10);
        assert_eq!(region.layers(), 1..=4);

        assert_eq!(Region::from_corners((-5, 0), (-1, 3)), None);
        assert_eq!(Region::from_corners((0, -4), (3, -2)), None);
    }

    #[test]
    fn test_notes_at_tick_in_layer_order() {
        let mut grid = NoteGrid::new();
        grid.insert_note(4, 2, note(2));
        grid.insert_note(4, 0, note(0));
        grid.insert_note(5, 1, note(9));
        grid.insert_note(4, 1, note(1));

        assert_eq!(keys(&grid.notes_at_tick(4)), vec![0, 1, 2]);
        assert_eq!(grid.last_tick(), Some(5));
    }

    #[test]
    fn test_select_region_and_invert() {
        let mut grid = NoteGrid::new();
        grid.insert_note(0, 0, note(1));
        grid.insert_note(1, 0, note(2));
        grid.insert_note(5, 5, note(3));

        assert_eq!(grid.select_region(&Region::new(0..=1, 0..=0), true), 2);
        assert_eq!(grid.selected_count(), 2);

        grid.select_region(&Region::cell(1, 0), false);
        assert!(grid.is_selected(0, 0));
        assert!(!grid.is_selected(1, 0));

        grid.invert_selection();
        assert_eq!(keys(&grid.selected_notes()), vec![2, 3]);

        grid.select_all();
        assert_eq!(grid.selected_count(), 3);
        grid.deselect_all();
        assert_eq!(grid.selected_count(), 0);
    }

    #[test]
    fn test_replacing_selected_note_clears_selection() {
        let mut grid = NoteGrid::new();
        grid.insert_note(0, 0, note(1));
        grid.select_all();

        grid.insert_note(0, 0, note(2));

        assert!(!grid.is_selected(0, 0));
    }

    #[test]
    fn test_remove_selected() {
        let mut grid = NoteGrid::new();
        grid.insert_note(3, 0, note(1));
        grid.insert_note(1, 0, note(2));
        grid.insert_note(2, 2, note(3));
        grid.select_region(&Region::new(0..=3, 0..=0), true);

        let removed = grid.remove_selected();

        assert_eq!(removed.iter().map(|n| n.key).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(grid.len(), 1);
        assert!(grid.note_at(2, 2).is_some());
    }

    #[test]
    fn test_move_clamp_is_all_or_nothing_per_axis() {
        let mut grid = NoteGrid::new();
        grid.insert_note(0, 5, note(1));
        grid.insert_note(3, 5, note(2));
        grid.select_all();

        let outcome = grid.move_selected(-1, 0);

        assert_eq!(outcome.delta_tick, 0);
        assert_eq!(grid.note_at(0, 5).map(|n| n.key), Some(1));
        assert_eq!(grid.note_at(3, 5).map(|n| n.key), Some(2));
    }

    #[test]
    fn test_move_suppresses_only_the_blocked_axis() {
        let mut grid = NoteGrid::new();
        grid.insert_note(2, 0, note(1));
        grid.insert_note(4, 3, note(2));
        grid.select_all();

        let outcome = grid.move_selected(-2, -1);

        assert_eq!((outcome.delta_tick, outcome.delta_layer), (-2, 0));
        assert_eq!(grid.note_at(0, 0).map(|n| n.key), Some(1));
        assert_eq!(grid.note_at(2, 3).map(|n| n.key), Some(2));
        assert!(grid.is_selected(0, 0), "moved notes stay selected");
    }

    #[test]
    fn test_move_overlapping_selection_keeps_all_notes() {
        // moving a run of adjacent notes right by one must not collide with itself
        let mut grid = NoteGrid::new();
        for tick in 0..4 {
            grid.insert_note(tick, 0, note(tick as u8));
        }
        grid.select_all();

        let outcome = grid.move_selected(1, 0);

        assert!(outcome.displaced.is_empty());
        assert_eq!(grid.len(), 4);
        assert_eq!(keys(&grid.notes()), vec![0, 1, 2, 3]);
        assert!(grid.note_at(0, 0).is_none());
        assert_eq!(grid.note_at(4, 0).map(|n| n.key), Some(3));
    }

    #[test]
    fn test_move_displaces_unselected_notes() {
        let mut grid = NoteGrid::new();
        grid.insert_note(0, 0, note(1));
        grid.insert_note(2, 1, note(2));
        grid.select_region(&Region::cell(0, 0), true);

        let outcome = grid.move_selected(2, 1);

        assert_eq!(outcome.displaced.len(), 1);
        assert_eq!(outcome.displaced[0].key, 2);
        assert_eq!(grid.note_at(2, 1).map(|n| n.key), Some(1));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_move_with_empty_selection() {
        let mut grid = NoteGrid::new();
        grid.insert_note(1, 1, note(1));

        let outcome = grid.move_selected(3, 3);

        assert!(outcome.displaced.is_empty());
        assert_eq!(grid.note_at(1, 1).map(|n| n.key), Some(1));
    }

    #[test]
    fn test_insert_layer_shifts_notes() {
        let mut grid = NoteGrid::with_layers(layers(3));
        grid.insert_note(5, 0, note(39));
        grid.insert_note(5, 1, note(40));
        grid.insert_note(5, 2, note(41));

        grid.insert_layer(1, Layer::new("New")).expect("insert");

        assert_eq!(grid.note_at(5, 0).map(|n| n.key), Some(39));
        assert!(grid.note_at(5, 1).is_none());
        assert_eq!(grid.note_at(5, 2).map(|n| n.key), Some(40));
        assert_eq!(grid.note_at(5, 3).map(|n| n.key), Some(41));
        assert_eq!(grid.note_at(5, 3).map(|n| n.layer), Some(3));
        assert_eq!(grid.layer(1).map(|l| l.name.as_str()), Ok("New"));
        assert_eq!(grid.layer_count(), 4);
    }

    #[test]
    fn test_insert_layer_on_rows_without_metadata() {
        let mut grid = NoteGrid::with_layers(layers(1));
        grid.insert_note(0, 3, note(1));

        grid.insert_layer(1, Layer::new("Inserted")).expect("insert");

        assert_eq!(grid.layer_count(), 2);
        assert_eq!(grid.layer(1).map(|l| l.name.as_str()), Ok("Inserted"));
        assert_eq!(grid.note_at(0, 4).map(|n| n.key), Some(1));
    }

    #[test]
    fn test_insert_layer_past_layer_count_fails() {
        let mut grid = NoteGrid::with_layers(layers(1));
        grid.insert_note(0, 3, note(1));
        let before = grid.clone();

        assert_eq!(
            grid.insert_layer(2, Layer::new("Inserted")),
            Err(GridError::IndexOutOfRange { index: 2, len: 1 })
        );
        assert_eq!(grid, before);
    }

    #[test]
    fn test_insert_layer_keeps_note_on_last_row() {
        let mut grid = NoteGrid::with_layers(layers(2));
        grid.insert_note(7, u32::MAX, note(9));
        let before = grid.clone();

        assert_eq!(
            grid.insert_layer(1, Layer::new("New")),
            Err(GridError::LayerOverflow { tick: 7 })
        );
        assert_eq!(grid, before);
        assert_eq!(grid.note_at(7, u32::MAX).map(|n| n.key), Some(9));
    }

    #[test]
    fn test_remove_layer_deletes_contained_notes() {
        let mut grid = NoteGrid::with_layers(layers(3));
        grid.insert_note(3, 0, note(10));
        grid.insert_note(3, 1, note(11));
        grid.insert_note(3, 2, note(12));

        let removed = grid.remove_layer(1).expect("remove");

        assert_eq!(removed.name, "Layer 2");
        assert_eq!(grid.note_at(3, 0).map(|n| n.key), Some(10));
        assert_eq!(grid.note_at(3, 1).map(|n| n.key), Some(12), "layer 2 shifted down");
        assert!(grid.note_at(3, 2).is_none());
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn test_remove_layer_out_of_range() {
        let mut grid = NoteGrid::with_layers(layers(2));

        assert_eq!(
            grid.remove_layer(2),
            Err(GridError::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn test_insert_then_remove_layer_round_trip() {
        let mut grid = NoteGrid::with_layers(layers(3));
        grid.insert_note(0, 0, note(1));
        grid.insert_note(4, 1, note(2));
        grid.insert_note(4, 2, note(3));
        grid.insert_note(9, 2, note(4));
        grid.select_region(&Region::cell(4, 2), true);
        let before = grid.clone();

        for index in 0..=3 {
            grid.insert_layer(index, Layer::new("Temp")).expect("insert");
            grid.remove_layer(index).expect("remove");
            assert_eq!(grid, before, "round trip at index {index}");
        }
    }

    #[test]
    fn test_round_trip_with_notes_above_layer_metadata() {
        let mut grid = NoteGrid::with_layers(vec![Layer::new("A")]);
        grid.insert_note(0, 3, note(1));
        grid.insert_note(2, 0, note(2));
        let before = grid.clone();

        for index in [0, 1, 2, 5] {
            let inserted = grid.insert_layer(index, Layer::new("Temp"));
            let removed = grid.remove_layer(index);
            assert_eq!(inserted.is_ok(), removed.is_ok(), "index {index}");
            assert_eq!(grid, before, "round trip at index {index}");
        }
    }

    #[test]
    fn test_swap_layers_swaps_content() {
        let mut grid = NoteGrid::with_layers(layers(3));
        grid.insert_note(1, 0, note(10));
        grid.insert_note(2, 2, note(12));
        grid.insert_note(3, 1, note(11));

        grid.swap_layers(0, 2).expect("swap");

        assert_eq!(grid.layer(0).map(|l| l.name.as_str()), Ok("Layer 3"));
        assert_eq!(grid.layer(2).map(|l| l.name.as_str()), Ok("Layer 1"));
        assert_eq!(grid.note_at(1, 2).map(|n| n.key), Some(10));
        assert_eq!(grid.note_at(2, 0).map(|n| n.key), Some(12));
        assert_eq!(grid.note_at(3, 1).map(|n| n.key), Some(11));
        assert!(grid.note_at(1, 0).is_none());
    }

    #[test]
    fn test_swap_layers_out_of_range() {
        let mut grid = NoteGrid::with_layers(layers(2));
        grid.insert_note(0, 0, note(1));

        assert!(grid.swap_layers(0, 3).is_err());
        assert_eq!(grid.note_at(0, 0).map(|n| n.key), Some(1));
    }

    #[test]
    fn test_layer_setters() {
        let mut grid = NoteGrid::with_layers(layers(1));

        grid.set_layer_name(0, "Melody").unwrap();
        grid.set_layer_volume(0, 180).unwrap();
        grid.set_layer_panning(0, -120).unwrap();
        grid.set_layer_locked(0, true).unwrap();
        grid.set_layer_solo(0, true).unwrap();

        let layer = grid.layer(0).unwrap();
        assert_eq!(layer.name, "Melody");
        assert_eq!(layer.volume, 100);
        assert_eq!(layer.panning, -100);
        assert!(layer.locked && layer.solo);

        assert_eq!(
            grid.set_layer_name(1, "Missing"),
            Err(GridError::IndexOutOfRange { index: 1, len: 1 })
        );
        assert!(grid.set_layer_volume(4, 10).is_err());
    }

    #[test]
    fn test_clear() {
        let mut grid = NoteGrid::with_layers(layers(2));
        grid.insert_note(0, 0, note(1));

        grid.clear();

        assert!(grid.is_empty());
        assert_eq!(grid.layer_count(), 0);
        assert_eq!(grid.height(), 0);
        assert_eq!(grid.last_tick(), None);
    }
}
