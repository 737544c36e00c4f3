//! Device-context state machine: pen/brush/font attributes, the save/restore stack, and the
//! slotted object table with stock-object aliasing.

use crate::types::{ColorRef, BLACK, WHITE};

/// `ROP2_COPYPEN`, the default raster operation. Recorded but never honored during rendering.
const ROP2_COPYPEN: u16 = 13;

/// `TA_LEFT | TA_TOP`, the default text alignment.
const TA_LEFT_TOP: u16 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenStyle {
    Solid,
    Dash,
    Dot,
    DashDot,
    DashDotDot,
    Null,
    InsideFrame,
}

impl From<u16> for PenStyle {
    #[inline]
    fn from(value: u16) -> Self {
        match value {
            1 => Self::Dash,
            2 => Self::Dot,
            3 => Self::DashDot,
            4 => Self::DashDotDot,
            5 => Self::Null,
            6 => Self::InsideFrame,
            _ => Self::Solid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushStyle {
    Solid,
    /// Covers both `BS_NULL` and `BS_HOLLOW`, which GDI assigns the same numeric value.
    Null,
    Hatched,
    Pattern,
    /// Any of the DIB-backed brush styles; not rendered (see crate-level Non-goals).
    Dib,
}

impl From<u16> for BrushStyle {
    #[inline]
    fn from(value: u16) -> Self {
        match value {
            1 => Self::Null,
            2 => Self::Hatched,
            3 => Self::Pattern,
            0 => Self::Solid,
            _ => Self::Dib,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundMode {
    Transparent,
    Opaque,
}

impl From<u16> for BackgroundMode {
    #[inline]
    fn from(value: u16) -> Self {
        if value == 1 {
            Self::Transparent
        } else {
            Self::Opaque
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolyFillMode {
    Alternate,
    Winding,
}

impl From<u16> for PolyFillMode {
    #[inline]
    fn from(value: u16) -> Self {
        if value == 2 {
            Self::Winding
        } else {
            Self::Alternate
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pen {
    pub style: PenStyle,
    pub color: ColorRef,
    pub width: f64,
}

impl Default for Pen {
    #[inline]
    fn default() -> Self {
        Self { style: PenStyle::Solid, color: BLACK, width: 1.0 }
    }
}

#[derive(Debug, Clone)]
pub struct Brush {
    pub style: BrushStyle,
    pub hatch: u16,
    pub color: ColorRef,
}

impl Default for Brush {
    #[inline]
    fn default() -> Self {
        Self { style: BrushStyle::Solid, hatch: 0, color: WHITE }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Font {
    pub face: Option<String>,
    pub height: i16,
    pub width: i16,
    pub escapement: i16,
    pub orientation: i16,
    pub weight: i16,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    pub charset: u8,
}

/// The current graphics state: selected pen/brush/font, text/background attributes, fill rule,
/// and ROP2. `pen_set`/`brush_set`/`font_set` track whether a real object backs the field (vs.
/// the all-defaults state a fresh [`DeviceContext`] starts in) independently of the object's own
/// style, mirroring how stock `NULL_PEN`/`NULL_BRUSH` selection differs from a custom object that
/// merely uses the `Null` style.
#[derive(Debug, Clone)]
pub struct DeviceContext {
    pub pen_set: bool,
    pub pen: Pen,
    pub brush_set: bool,
    pub brush: Brush,
    pub font_set: bool,
    pub font: Font,
    pub text_color: ColorRef,
    pub text_align: u16,
    pub bk_color: ColorRef,
    pub bk_mode: BackgroundMode,
    pub poly_fill_mode: PolyFillMode,
    pub rop2: u16,
}

impl Default for DeviceContext {
    #[inline]
    fn default() -> Self {
        Self {
            pen_set: true,
            pen: Pen::default(),
            brush_set: true,
            brush: Brush::default(),
            font_set: false,
            font: Font::default(),
            text_color: BLACK,
            text_align: TA_LEFT_TOP,
            bk_color: WHITE,
            bk_mode: BackgroundMode::Opaque,
            poly_fill_mode: PolyFillMode::Alternate,
            rop2: ROP2_COPYPEN,
        }
    }
}

/// LIFO of device-context snapshots backing `SAVEDC`/`RESTOREDC`.
#[derive(Debug, Default)]
pub struct DeviceContextStack {
    frames: Vec<DeviceContext>,
}

impl DeviceContextStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&mut self, dc: &DeviceContext) {
        self.frames.push(dc.clone());
    }

    /// Restores `current` from the stack, popping `n` frames for positive `n` or `|n|` frames
    /// for negative `n`; `n == 0` is a no-op. If the stack runs out before `|n|` pops, restoring
    /// stops at the oldest available frame.
    pub fn restore(&mut self, current: &mut DeviceContext, n: i16) {
        if n == 0 {
            return;
        }
        for _ in 0..n.unsigned_abs() {
            match self.frames.pop() {
                Some(frame) => *current = frame,
                None => break,
            }
        }
    }
}

/// Well-known GDI stock objects, selected via a handle with the high bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockObject {
    WhiteBrush,
    LtGrayBrush,
    GrayBrush,
    DkGrayBrush,
    BlackBrush,
    NullBrush,
    WhitePen,
    BlackPen,
    NullPen,
}

/// An object handle as selected by `SELECTOBJECT`: either a slot index into the object table, a
/// recognized stock object, or a stock handle this interpreter doesn't assign meaning to (a
/// no-op, per spec: "silently use current defaults").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectHandle {
    Slot(u16),
    Stock(StockObject),
    UnknownStock,
}

/// High bit of a 16-bit object handle marking it as a stock-object reference. Handles are kept
/// at their recorded 16-bit width; do not silently widen to `u32`.
const STOCK_FLAG: u16 = 0x8000;

#[must_use]
pub fn decode_handle(handle: u16) -> ObjectHandle {
    if handle & STOCK_FLAG == 0 {
        return ObjectHandle::Slot(handle);
    }
    match handle & !STOCK_FLAG {
        0 => ObjectHandle::Stock(StockObject::WhiteBrush),
        1 => ObjectHandle::Stock(StockObject::LtGrayBrush),
        2 => ObjectHandle::Stock(StockObject::GrayBrush),
        3 => ObjectHandle::Stock(StockObject::DkGrayBrush),
        4 => ObjectHandle::Stock(StockObject::BlackBrush),
        5 => ObjectHandle::Stock(StockObject::NullBrush),
        6 => ObjectHandle::Stock(StockObject::WhitePen),
        7 => ObjectHandle::Stock(StockObject::BlackPen),
        8 => ObjectHandle::Stock(StockObject::NullPen),
        _ => ObjectHandle::UnknownStock,
    }
}

/// Applies a recognized stock object's attributes to `dc`.
pub fn apply_stock_object(dc: &mut DeviceContext, stock: StockObject) {
    match stock {
        StockObject::WhiteBrush => set_solid_brush(dc, WHITE),
        StockObject::LtGrayBrush => set_solid_brush(dc, ColorRef::new(192, 192, 192)),
        StockObject::GrayBrush => set_solid_brush(dc, ColorRef::new(128, 128, 128)),
        StockObject::DkGrayBrush => set_solid_brush(dc, ColorRef::new(64, 64, 64)),
        StockObject::BlackBrush => set_solid_brush(dc, BLACK),
        StockObject::NullBrush => {
            dc.brush_set = false;
            dc.brush.style = BrushStyle::Null;
        }
        StockObject::WhitePen => set_solid_pen(dc, WHITE),
        StockObject::BlackPen => set_solid_pen(dc, BLACK),
        StockObject::NullPen => {
            dc.pen_set = false;
            dc.pen.style = PenStyle::Null;
        }
    }
}

fn set_solid_brush(dc: &mut DeviceContext, color: ColorRef) {
    dc.brush_set = true;
    dc.brush = Brush { style: BrushStyle::Solid, hatch: 0, color };
}

fn set_solid_pen(dc: &mut DeviceContext, color: ColorRef) {
    dc.pen_set = true;
    dc.pen = Pen { style: PenStyle::Solid, color, width: 1.0 };
}

/// A single slot in the [`ObjectTable`].
#[derive(Debug, Clone, Default)]
pub enum ObjectSlot {
    #[default]
    Invalid,
    Pen(Pen),
    Brush(Brush),
    Font(Font),
    Palette,
    Region,
}

/// Fixed-length array of object slots, sized by the header-declared object count. Creates
/// populate the first [`ObjectSlot::Invalid`] slot; deletes clear a slot back to `Invalid`.
#[derive(Debug, Default)]
pub struct ObjectTable {
    slots: Vec<ObjectSlot>,
}

impl ObjectTable {
    #[must_use]
    pub fn new(count: u16) -> Self {
        Self { slots: vec![ObjectSlot::Invalid; usize::from(count)] }
    }

    /// Stores `slot` in the first `Invalid` slot, returning its index. Returns `None` if no slot
    /// is free; the caller logs and drops the record in that case.
    pub fn allocate(&mut self, slot: ObjectSlot) -> Option<u16> {
        let index = self.slots.iter().position(|s| matches!(s, ObjectSlot::Invalid))?;
        self.slots[index] = slot;
        Some(index as u16)
    }

    #[must_use]
    pub fn get(&self, index: u16) -> Option<&ObjectSlot> {
        self.slots.get(usize::from(index))
    }

    /// Clears a slot back to `Invalid`. A delete of an out-of-range or already-invalid handle is
    /// a no-op.
    pub fn delete(&mut self, index: u16) {
        if let Some(slot) = self.slots.get_mut(usize::from(index)) {
            *slot = ObjectSlot::Invalid;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_restore_round_trips_to_prior_state() {
        let mut dc = DeviceContext::default();
        dc.pen.color = ColorRef::new(255, 0, 0);
        let mut stack = DeviceContextStack::new();
        stack.save(&dc);

        dc.pen.color = ColorRef::new(0, 255, 0);
        stack.restore(&mut dc, 1);

        assert_eq!(dc.pen.color, ColorRef::new(255, 0, 0));
    }

    #[test]
    fn restore_negative_two_pops_two_frames() {
        let mut dc = DeviceContext::default();
        dc.pen.color = ColorRef::new(255, 0, 0);
        let mut stack = DeviceContextStack::new();
        stack.save(&dc); // saved: red

        dc.pen.color = ColorRef::new(0, 0, 255);
        stack.save(&dc); // saved: blue

        dc.pen.color = ColorRef::new(0, 255, 0); // current: green

        stack.restore(&mut dc, -2);
        assert_eq!(dc.pen.color, ColorRef::new(255, 0, 0));
    }

    #[test]
    fn restore_zero_is_a_no_op() {
        let mut dc = DeviceContext::default();
        dc.pen.color = ColorRef::new(255, 0, 0);
        let mut stack = DeviceContextStack::new();
        stack.save(&dc);
        dc.pen.color = ColorRef::new(0, 0, 255);
        stack.restore(&mut dc, 0);
        assert_eq!(dc.pen.color, ColorRef::new(0, 0, 255));
    }

    #[test]
    fn object_table_allocate_delete_reuses_slot() {
        let mut table = ObjectTable::new(2);
        let first = table.allocate(ObjectSlot::Pen(Pen::default())).unwrap();
        let second = table.allocate(ObjectSlot::Brush(Brush::default())).unwrap();
        assert!(table.allocate(ObjectSlot::Pen(Pen::default())).is_none());

        table.delete(first);
        assert!(matches!(table.get(first), Some(ObjectSlot::Invalid)));

        let reused = table.allocate(ObjectSlot::Font(Font::default())).unwrap();
        assert_eq!(reused, first);
        assert_ne!(reused, second);
    }

    #[test]
    fn decodes_stock_and_slot_handles() {
        assert_eq!(decode_handle(0x0007), ObjectHandle::Slot(7));
        assert_eq!(decode_handle(0x8007), ObjectHandle::Stock(StockObject::BlackPen));
        assert_eq!(decode_handle(0x80FF), ObjectHandle::UnknownStock);
    }

    #[test]
    fn null_pen_clears_pen_set_flag() {
        let mut dc = DeviceContext::default();
        apply_stock_object(&mut dc, StockObject::NullPen);
        assert!(!dc.pen_set);
        assert_eq!(dc.pen.style, PenStyle::Null);
    }
}
