//! The struct layout packer.
//!
//! Assigns every field a position in its struct's data or pointer
//! section. Sub-word fields split larger slots and leave "holes" that
//! later sub-word fields reuse; variants of one union share a slot that
//! widens as bigger variants arrive. Items are packed in declaration
//! number order, never source order: numbers define wire compatibility,
//! so a higher-numbered addition must never move a lower-numbered field.

use std::collections::{BTreeMap, HashMap};

use log::trace;
use trellis_span::{Diagnostic, Errors, IntoDiagnostic};

use trellis_ast::DeclKind;

use crate::{
    desc::{
        DataSectionSize, DataSize, FieldOffset, FieldSize, Node, StructLayout, UnionLayout,
    },
    error::LayoutError,
};

pub(crate) fn layout_pass(node: &Node, report: &mut Errors<Diagnostic>) {
    if node.kind() == DeclKind::Struct {
        pack_struct(node, report);
    }
    for child in node.children() {
        layout_pass(child, report);
    }
}

fn pack_struct(node: &Node, report: &mut Errors<Diagnostic>) {
    enum Item {
        Field(Node),
        Union(Node),
        Member { field: Node, union: Node },
    }

    let mut items = Vec::new();
    for child in node.children() {
        if child.is_misplaced() {
            continue;
        }
        match child.kind() {
            DeclKind::Field => {
                if let Some(number) = child.ordinal() {
                    items.push((number, Item::Field(child.clone())));
                }
            }
            DeclKind::Union => {
                if let Some(number) = child.ordinal() {
                    items.push((number, Item::Union(child.clone())));
                }
                for field in child.children() {
                    if let Some(number) = field.ordinal() {
                        items.push((
                            number,
                            Item::Member {
                                field: field.clone(),
                                union: child.clone(),
                            },
                        ));
                    }
                }
            }
            _ => {}
        }
    }
    items.sort_by_key(|&(number, _)| number);

    let mut state = PackingState::new();
    let mut slots: HashMap<Node, UnionSlots> = HashMap::new();
    let mut packing = BTreeMap::new();

    for (number, item) in items {
        match item {
            Item::Union(union) => {
                let offset = state.pack_data(DataSize::Size16);
                trace!("union '{}' tag at 16-bit slot {offset}", union.name());
                packing.insert(number, FieldOffset::Data(DataSize::Size16, offset));
                slots.entry(union).or_default();
            }
            Item::Field(field) => {
                if let Some(ty) = field.ty() {
                    let offset = state.pack_value(ty.field_size());
                    trace!("field '{}' at {offset:?}", field.name());
                    packing.insert(number, offset);
                }
            }
            Item::Member { field, union } => {
                if let Some(ty) = field.ty() {
                    let slot = slots.entry(union).or_default();
                    let offset = state.pack_unionized(slot, ty.field_size());
                    trace!("union member '{}' at {offset:?}", field.name());
                    packing.insert(number, offset);
                }
            }
        }
    }

    let data_size = state.final_data_size();
    let pointer_count = state.pointer_count;
    if let (Some(fixed), Some(fixed_loc)) = (node.fixed(), node.fixed_loc()) {
        if !legal_fixed_bits(fixed.data_bits) {
            report.push(LayoutError::BadFixedSize.into_diagnostic(fixed_loc));
        } else if data_size.bits() > fixed.data_bits {
            // The error is recoverable: the actual layout stands so the
            // rest of the file keeps compiling.
            report.push(
                LayoutError::FixedDataExceeded {
                    actual: data_size.bits(),
                    requested: fixed.data_bits,
                }
                .into_diagnostic(fixed_loc),
            );
        }
        if pointer_count > fixed.pointer_count as u64 {
            report.push(
                LayoutError::FixedPointersExceeded {
                    actual: pointer_count,
                    requested: fixed.pointer_count,
                }
                .into_diagnostic(fixed_loc),
            );
        }
    }

    node.set_layout(StructLayout {
        data_size,
        pointer_count: pointer_count as u32,
        packing: packing.clone(),
    });

    for child in node.children() {
        if child.kind() == DeclKind::Union && !child.is_misplaced() {
            let tag_offset = child
                .ordinal()
                .and_then(|number| packing.get(&number).copied())
                .unwrap_or(FieldOffset::Void);

            let mut numbers: Vec<u32> =
                child.children().iter().filter_map(Node::ordinal).collect();
            numbers.sort_unstable();
            let discriminants = numbers
                .into_iter()
                .enumerate()
                .map(|(index, number)| (number, index as u16))
                .collect();

            child.set_union_layout(UnionLayout {
                tag_offset,
                discriminants,
            });
        }
    }
}

fn legal_fixed_bits(bits: u64) -> bool {
    matches!(bits, 0 | 1 | 8 | 16 | 32) || bits % 64 == 0
}

/// The growing footprint of a struct while its items are packed.
#[derive(Debug, Clone, Default)]
pub(crate) struct PackingState {
    /// At most one reusable hole per sub-word size: the offset (in units
    /// of that size) of the rightmost free slot of that width.
    holes: BTreeMap<DataSize, u64>,
    data_words: u64,
    pointer_count: u64,
}

/// Storage shared by the variants of one union, widened as variants
/// arrive.
#[derive(Debug, Clone, Default)]
pub(crate) struct UnionSlots {
    data: Option<(DataSectionSize, u64)>,
    pointer: Option<(u32, u64)>,
}

impl PackingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer_count(&self) -> u64 {
        self.pointer_count
    }

    /// Allocates a data slot of the given width, reusing a hole when one
    /// fits, otherwise splitting the next larger width and remembering
    /// the remainder as a new hole.
    pub fn pack_data(&mut self, size: DataSize) -> u64 {
        if size == DataSize::Size64 {
            let offset = self.data_words;
            self.data_words += 1;
            return offset;
        }

        if let Some(&hole) = self.holes.get(&size) {
            if size == DataSize::Size1 {
                // Bit holes advance through their byte and vanish at its
                // end.
                if (hole + 1) % 8 == 0 {
                    self.holes.remove(&size);
                } else {
                    self.holes.insert(size, hole + 1);
                }
            } else {
                self.holes.remove(&size);
            }
            return hole;
        }

        let parent = size.next_larger().expect("sub-word size has a parent");
        let parent_offset = self.pack_data(parent);
        let ratio = parent.bits() / size.bits();
        let offset = parent_offset * ratio;
        self.holes.insert(size, offset + 1);
        offset
    }

    /// Packs one non-unionized item.
    pub fn pack_value(&mut self, size: FieldSize) -> FieldOffset {
        match size {
            FieldSize::Void => FieldOffset::Void,
            FieldSize::Reference => {
                let offset = self.pointer_count;
                self.pointer_count += 1;
                FieldOffset::Pointer(offset)
            }
            FieldSize::Data(size) => FieldOffset::Data(size, self.pack_data(size)),
            FieldSize::InlineComposite(section, pointers) => {
                let data_offset = match section.data_size() {
                    // Sub-word data packs at its own alignment.
                    Some(size) => self.pack_data(size),
                    None => {
                        let offset = self.data_words;
                        self.data_words += section.words();
                        offset
                    }
                };
                let pointer_offset = self.pointer_count;
                self.pointer_count += pointers as u64;
                FieldOffset::InlineComposite {
                    data_offset,
                    pointer_offset,
                    data_size: section,
                    pointer_count: pointers,
                }
            }
        }
    }

    /// Packs a variant of a union, sharing the union's slots.
    pub fn pack_unionized(&mut self, slots: &mut UnionSlots, size: FieldSize) -> FieldOffset {
        match size {
            FieldSize::Void => FieldOffset::Void,
            FieldSize::Reference => FieldOffset::Pointer(self.pack_union_pointers(slots, 1)),
            FieldSize::Data(size) => {
                FieldOffset::Data(size, self.pack_union_data(slots, size))
            }
            FieldSize::InlineComposite(section, pointers) => {
                let data_offset = match (section.data_size(), section.words()) {
                    (Some(size), _) => self.pack_union_data(slots, size),
                    (None, 0) => match slots.data {
                        Some((DataSectionSize::Words(_), offset)) => offset,
                        _ => self.data_words,
                    },
                    (None, words) => self.pack_union_data_words(slots, words),
                };
                let pointer_offset = self.pack_union_pointers(slots, pointers);
                FieldOffset::InlineComposite {
                    data_offset,
                    pointer_offset,
                    data_size: section,
                    pointer_count: pointers,
                }
            }
        }
    }

    fn pack_union_data(&mut self, slots: &mut UnionSlots, desired: DataSize) -> u64 {
        match slots.data {
            None => {
                let offset = self.pack_data(desired);
                slots.data = Some((desired.into(), offset));
                offset
            }
            // A word-sized slot holds any sub-word request; convert the
            // word offset to the requested granularity.
            Some((DataSectionSize::Words(_), word_offset)) => {
                word_offset * (64 / desired.bits())
            }
            Some((section, offset)) => {
                let slot_size = section.data_size().expect("sub-word union slot");
                let mut scratch = self.holes.clone();
                match try_expand_sub_word_data_slot(&mut scratch, (slot_size, offset), desired)
                {
                    Some((new_slot, offset)) => {
                        self.holes = scratch;
                        slots.data = Some((new_slot.0.into(), new_slot.1));
                        offset
                    }
                    None => {
                        // The slot cannot grow where it is; a fresh slot
                        // still gets to reuse whatever holes fit it.
                        let offset = self.pack_data(desired);
                        slots.data = Some((desired.into(), offset));
                        offset
                    }
                }
            }
        }
    }

    fn pack_union_data_words(&mut self, slots: &mut UnionSlots, words: u64) -> u64 {
        if let Some((DataSectionSize::Words(have), offset)) = slots.data {
            if have >= 1 {
                if words <= have {
                    return offset;
                }
                if offset + have == self.data_words {
                    // The slot ends at the data section's tail; grow it
                    // in place.
                    self.data_words += words - have;
                    slots.data = Some((DataSectionSize::Words(words), offset));
                    return offset;
                }
            }
        }

        let offset = self.data_words;
        self.data_words += words;
        slots.data = Some((DataSectionSize::Words(words), offset));
        offset
    }

    fn pack_union_pointers(&mut self, slots: &mut UnionSlots, count: u32) -> u64 {
        if count == 0 {
            return match slots.pointer {
                Some((_, offset)) => offset,
                None => self.pointer_count,
            };
        }

        match slots.pointer {
            None => {
                let offset = self.pointer_count;
                self.pointer_count += count as u64;
                slots.pointer = Some((count, offset));
                offset
            }
            Some((have, offset)) if count <= have => offset,
            Some((have, offset)) if offset + have as u64 == self.pointer_count => {
                self.pointer_count += (count - have) as u64;
                slots.pointer = Some((count, offset));
                offset
            }
            Some(_) => {
                let offset = self.pointer_count;
                self.pointer_count += count as u64;
                slots.pointer = Some((count, offset));
                offset
            }
        }
    }

    /// The final size of the data section. A single word shrinks to the
    /// smallest sub-word size whose upper remainder is still a hole, so
    /// no reported section drags trailing free bits along.
    pub fn final_data_size(&self) -> DataSectionSize {
        if self.data_words != 1 {
            return DataSectionSize::Words(self.data_words);
        }

        let mut size = DataSize::Size64;
        while let Some(smaller) = size.next_smaller() {
            if self.holes.get(&smaller) == Some(&1) {
                size = smaller;
            } else {
                break;
            }
        }
        size.into()
    }
}

/// Tries to widen a sub-word union slot in place to hold `desired`.
///
/// A slot can absorb its right neighbor when it is aligned for the next
/// larger width and that neighbor is currently a hole; the two coalesce
/// and the attempt recurses one width up. Works on a scratch copy of the
/// hole table; the caller commits it only on success.
fn try_expand_sub_word_data_slot(
    holes: &mut BTreeMap<DataSize, u64>,
    slot: (DataSize, u64),
    desired: DataSize,
) -> Option<((DataSize, u64), u64)> {
    let (size, offset) = slot;

    if size.bits() >= desired.bits() {
        let sub_index = offset * (size.bits() / desired.bits());
        return Some(((size, offset), sub_index));
    }

    let next = size.next_larger()?;
    let ratio = next.bits() / size.bits();
    if offset % ratio != 0 {
        return None;
    }
    if holes.get(&size) != Some(&(offset + 1)) {
        return None;
    }
    holes.remove(&size);
    try_expand_sub_word_data_slot(holes, (next, offset / ratio), desired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use DataSize::*;

    #[test]
    fn two_bit_fields_share_the_first_byte() {
        let mut state = PackingState::new();
        assert_eq!(state.pack_value(FieldSize::Data(Size1)), FieldOffset::Data(Size1, 0));
        assert_eq!(state.pack_value(FieldSize::Data(Size1)), FieldOffset::Data(Size1, 1));
        assert_eq!(state.final_data_size(), DataSectionSize::Bits8);
    }

    #[test]
    fn empty_struct_has_no_footprint() {
        let state = PackingState::new();
        assert_eq!(state.final_data_size(), DataSectionSize::Words(0));
        assert_eq!(state.pointer_count(), 0);
    }

    #[test]
    fn eighth_bit_fills_the_byte_and_leaves_no_hole() {
        let mut state = PackingState::new();
        for expected in 0..8 {
            assert_eq!(state.pack_data(Size1), expected);
        }
        assert!(state.holes.get(&Size1).is_none());
        // The next bit splits the byte hole left by the original word.
        assert_eq!(state.pack_data(Size1), 8);
    }

    #[test]
    fn union_variants_promote_their_shared_slot() {
        // A union tag, then a bool variant, then an int32 variant: the
        // bool lands inside the tag's word and the int32 takes the
        // word's upper half.
        let mut state = PackingState::new();
        let mut slots = UnionSlots::default();

        assert_eq!(state.pack_data(Size16), 0);
        assert_eq!(
            state.pack_unionized(&mut slots, FieldSize::Data(Size1)),
            FieldOffset::Data(Size1, 16)
        );
        assert_eq!(
            state.pack_unionized(&mut slots, FieldSize::Data(Size32)),
            FieldOffset::Data(Size32, 1)
        );
        assert_eq!(state.final_data_size(), DataSectionSize::Words(1));
    }

    #[test]
    fn failed_expansion_leaves_the_holes_alone() {
        // Same shape as above; after the int32 relocates the slot, the
        // bit and byte holes of the first word must still be reusable.
        let mut state = PackingState::new();
        let mut slots = UnionSlots::default();
        state.pack_data(Size16);
        state.pack_unionized(&mut slots, FieldSize::Data(Size1));
        state.pack_unionized(&mut slots, FieldSize::Data(Size32));

        assert_eq!(state.pack_data(Size8), 3);
        assert_eq!(state.pack_data(Size1), 17);
    }

    #[test]
    fn sub_word_slot_expands_in_place_when_aligned() {
        let mut state = PackingState::new();
        let mut slots = UnionSlots::default();

        assert_eq!(
            state.pack_unionized(&mut slots, FieldSize::Data(Size1)),
            FieldOffset::Data(Size1, 0)
        );
        assert_eq!(
            state.pack_unionized(&mut slots, FieldSize::Data(Size8)),
            FieldOffset::Data(Size8, 0)
        );
        assert_eq!(
            state.pack_unionized(&mut slots, FieldSize::Data(Size64)),
            FieldOffset::Data(Size64, 0)
        );
        assert_eq!(state.final_data_size(), DataSectionSize::Words(1));
    }

    #[test]
    fn smaller_variants_reuse_a_word_slot() {
        let mut state = PackingState::new();
        let mut slots = UnionSlots::default();

        assert_eq!(
            state.pack_unionized(&mut slots, FieldSize::Data(Size64)),
            FieldOffset::Data(Size64, 0)
        );
        assert_eq!(
            state.pack_unionized(&mut slots, FieldSize::Data(Size1)),
            FieldOffset::Data(Size1, 0)
        );
        assert_eq!(
            state.pack_unionized(&mut slots, FieldSize::Data(Size16)),
            FieldOffset::Data(Size16, 0)
        );
    }

    #[test]
    fn misaligned_slot_cannot_coalesce() {
        let mut holes = BTreeMap::new();
        holes.insert(Size16, 2);
        assert_eq!(
            try_expand_sub_word_data_slot(&mut holes, (Size16, 1), Size32),
            None
        );
        assert_eq!(holes.get(&Size16), Some(&2));
    }

    #[test]
    fn union_pointer_slot_grows_at_the_tail() {
        let mut state = PackingState::new();
        let mut slots = UnionSlots::default();

        assert_eq!(
            state.pack_unionized(&mut slots, FieldSize::Reference),
            FieldOffset::Pointer(0)
        );
        assert_eq!(
            state.pack_unionized(
                &mut slots,
                FieldSize::InlineComposite(DataSectionSize::Words(1), 3)
            ),
            FieldOffset::InlineComposite {
                data_offset: 0,
                pointer_offset: 0,
                data_size: DataSectionSize::Words(1),
                pointer_count: 3,
            }
        );
        assert_eq!(state.pointer_count(), 3);
        assert_eq!(
            state.pack_unionized(&mut slots, FieldSize::Reference),
            FieldOffset::Pointer(0)
        );
    }

    #[test]
    fn union_pointer_slot_relocates_when_boxed_in() {
        let mut state = PackingState::new();
        let mut slots = UnionSlots::default();

        state.pack_unionized(&mut slots, FieldSize::Reference);
        // An unrelated pointer lands after the slot, so the slot cannot
        // grow in place.
        assert_eq!(state.pack_value(FieldSize::Reference), FieldOffset::Pointer(1));
        assert_eq!(
            state.pack_unionized(
                &mut slots,
                FieldSize::InlineComposite(DataSectionSize::Words(0), 2)
            ),
            FieldOffset::InlineComposite {
                data_offset: 0,
                pointer_offset: 2,
                data_size: DataSectionSize::Words(0),
                pointer_count: 2,
            }
        );
        assert_eq!(state.pointer_count(), 4);
    }

    #[test]
    fn multiword_union_slot_grows_in_place_at_the_tail() {
        let mut state = PackingState::new();
        let mut slots = UnionSlots::default();

        let one_word = FieldSize::InlineComposite(DataSectionSize::Words(1), 0);
        let three_words = FieldSize::InlineComposite(DataSectionSize::Words(3), 0);
        let two_words = FieldSize::InlineComposite(DataSectionSize::Words(2), 0);

        assert!(matches!(
            state.pack_unionized(&mut slots, one_word),
            FieldOffset::InlineComposite { data_offset: 0, .. }
        ));
        assert!(matches!(
            state.pack_unionized(&mut slots, three_words),
            FieldOffset::InlineComposite { data_offset: 0, .. }
        ));
        assert_eq!(state.data_words, 3);
        assert!(matches!(
            state.pack_unionized(&mut slots, two_words),
            FieldOffset::InlineComposite { data_offset: 0, .. }
        ));
        assert_eq!(state.data_words, 3);
    }

    #[test]
    fn multiword_union_slot_relocates_once_the_tail_moves() {
        let mut state = PackingState::new();
        let mut slots = UnionSlots::default();

        let one_word = FieldSize::InlineComposite(DataSectionSize::Words(1), 0);
        state.pack_unionized(&mut slots, one_word);
        // A plain field claims the word after the slot.
        state.pack_value(FieldSize::Data(Size64));

        let two_words = FieldSize::InlineComposite(DataSectionSize::Words(2), 0);
        assert!(matches!(
            state.pack_unionized(&mut slots, two_words),
            FieldOffset::InlineComposite { data_offset: 2, .. }
        ));
        assert_eq!(state.data_words, 4);
    }

    #[test]
    fn final_size_strips_exactly_the_free_upper_holes() {
        let mut state = PackingState::new();
        state.pack_data(Size16);
        assert_eq!(state.final_data_size(), DataSectionSize::Bits16);

        let mut state = PackingState::new();
        state.pack_data(Size32);
        state.pack_data(Size32);
        assert_eq!(state.final_data_size(), DataSectionSize::Words(1));

        let mut state = PackingState::new();
        state.pack_data(Size64);
        state.pack_data(Size64);
        assert_eq!(state.final_data_size(), DataSectionSize::Words(2));
    }

    #[test]
    fn legal_fixed_sizes() {
        for bits in [0, 1, 8, 16, 32, 64, 128, 640] {
            assert!(legal_fixed_bits(bits), "{bits} bits should be legal");
        }
        for bits in [2, 7, 24, 33, 63, 65, 100] {
            assert!(!legal_fixed_bits(bits), "{bits} bits should be illegal");
        }
    }
}
