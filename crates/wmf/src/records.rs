//! The record demultiplexer: opcode dispatch, per-record field decoding, and SVG emission for
//! every supported WMF drawing/state record.

use wmf2svg_core::data::{DataCursorRef, DataCursorTrait, Endian, EndianRead};

use crate::ConvertOptions;
use crate::coords::{self, CoordinateEngine};
use crate::header::ParsedHeader;
use crate::state::{
    Brush, BrushStyle, DeviceContext, DeviceContextStack, Font, ObjectHandle, ObjectSlot,
    ObjectTable, Pen, PenStyle, PolyFillMode, apply_stock_object, decode_handle,
};
use crate::svg::{SvgWriter, escape_text};
use crate::types::{ColorRef, Rect16};

/// Hard cap on the number of records a single conversion will process, guarding against
/// zero-size records or cyclic offsets in pathological input.
const MAX_RECORDS: usize = 100_000;

type RResult<T> = core::result::Result<T, wmf2svg_core::data::Error>;

/// The `iType` low byte every WMF record dispatches on. Values are the canonical record-type
/// indices from the Windows Metafile format (the low byte of the classic `META_*` function
/// numbers); the high byte of the function code is a parameter-count hint this interpreter
/// doesn't need and never inspects.
mod opcodes {
    pub const EOF: u8 = 0x00;
    pub const SETBKCOLOR: u8 = 0x01;
    pub const SETBKMODE: u8 = 0x02;
    pub const SETMAPMODE: u8 = 0x03;
    pub const SETROP2: u8 = 0x04;
    pub const SETPOLYFILLMODE: u8 = 0x06;
    pub const SETTEXTCOLOR: u8 = 0x09;
    pub const SETWINDOWORG: u8 = 0x0B;
    pub const SETWINDOWEXT: u8 = 0x0C;
    pub const SETVIEWPORTORG: u8 = 0x0D;
    pub const SETVIEWPORTEXT: u8 = 0x0E;
    pub const LINETO: u8 = 0x13;
    pub const MOVETO: u8 = 0x14;
    pub const ARC: u8 = 0x17;
    pub const ELLIPSE: u8 = 0x18;
    pub const PIE: u8 = 0x1A;
    pub const RECTANGLE: u8 = 0x1B;
    pub const ROUNDRECT: u8 = 0x1C;
    pub const SAVEDC: u8 = 0x1E;
    pub const TEXTOUT: u8 = 0x21;
    pub const POLYGON: u8 = 0x24;
    pub const POLYLINE: u8 = 0x25;
    pub const RESTOREDC: u8 = 0x27;
    pub const SELECTOBJECT: u8 = 0x2D;
    pub const SETTEXTALIGN: u8 = 0x2E;
    pub const CHORD: u8 = 0x30;
    pub const EXTTEXTOUT: u8 = 0x32;
    pub const POLYPOLYGON: u8 = 0x38;
    pub const DELETEOBJECT: u8 = 0xF0;
    pub const CREATEPENINDIRECT: u8 = 0xFA;
    pub const CREATEFONTINDIRECT: u8 = 0xFB;
    pub const CREATEBRUSHINDIRECT: u8 = 0xFC;
}

const TA_CENTER_RIGHT_MASK: u16 = 0x06;
const TA_CENTER: u16 = 0x06;
const TA_RIGHT: u16 = 0x02;

const ETO_OPAQUE: u16 = 0x0002;
const ETO_CLIPPED: u16 = 0x0004;

/// The full interpreter state threaded through a single conversion: device context plus its
/// save/restore stack, the object table, the coordinate engine, the current pen position, and
/// the SVG output buffer.
struct Interp {
    dc: DeviceContext,
    stack: DeviceContextStack,
    objects: ObjectTable,
    coords: CoordinateEngine,
    /// Becomes `true` the first time `SETVIEWPORTEXT` is seen. Until then, `SETWINDOWEXT`
    /// mirrors its value into the viewport extent as well, so a file that only ever calls
    /// `SETWINDOWEXT` (as in the common case of an identity MM_TEXT-style mapping) still scales
    /// coordinates by 1 instead of collapsing them toward the viewport origin.
    viewport_ext_explicit: bool,
    cur_x: f64,
    cur_y: f64,
    svg: SvgWriter,
}

impl Interp {
    fn new(object_count: u16, scaling: f64, name_space: &str) -> Self {
        Self {
            dc: DeviceContext::default(),
            stack: DeviceContextStack::new(),
            objects: ObjectTable::new(object_count),
            coords: CoordinateEngine::new(scaling),
            viewport_ext_explicit: false,
            cur_x: 0.0,
            cur_y: 0.0,
            svg: SvgWriter::new(name_space),
        }
    }

    /// Decodes and applies one record's effect on the interpreter state, emitting SVG as
    /// appropriate. `record` is the full record body, sliced to its declared length, positioned
    /// so that a cursor started at offset 0 and seeked to 6 lands just past `Size16w` and
    /// `FunctionCode`.
    fn dispatch(&mut self, i_type: u8, record: &[u8]) -> RResult<()> {
        let mut cursor = DataCursorRef::new(record, Endian::Little);
        cursor.set_position(6);

        match i_type {
            opcodes::SETBKCOLOR => self.dc.bk_color = ColorRef::from_colorref(cursor.read_u32()?),
            opcodes::SETBKMODE => self.dc.bk_mode = cursor.read_u16()?.into(),
            opcodes::SETMAPMODE => self.coords.map_mode = cursor.read_u16()?,
            opcodes::SETROP2 => self.dc.rop2 = cursor.read_u16()?,
            opcodes::SETPOLYFILLMODE => self.dc.poly_fill_mode = cursor.read_u16()?.into(),
            opcodes::SETTEXTCOLOR => self.dc.text_color = ColorRef::from_colorref(cursor.read_u32()?),
            opcodes::SETTEXTALIGN => self.dc.text_align = cursor.read_u16()?,
            opcodes::SETWINDOWORG => self.coords.window_org = read_point_yx(&mut cursor)?,
            opcodes::SETVIEWPORTORG => self.coords.viewport_org = read_point_yx(&mut cursor)?,
            opcodes::SETWINDOWEXT => {
                let ext = read_point_yx(&mut cursor)?;
                self.coords.window_ext = ext;
                if !self.viewport_ext_explicit {
                    self.coords.viewport_ext = ext;
                }
            }
            opcodes::SETVIEWPORTEXT => {
                self.coords.viewport_ext = read_point_yx(&mut cursor)?;
                self.viewport_ext_explicit = true;
            }
            opcodes::SAVEDC => self.stack.save(&self.dc),
            opcodes::RESTOREDC => self.stack.restore(&mut self.dc, cursor.read_i16()?),
            opcodes::MOVETO => self.move_to(&mut cursor)?,
            opcodes::LINETO => self.line_to(&mut cursor)?,
            opcodes::RECTANGLE => self.rectangle(&mut cursor)?,
            opcodes::ROUNDRECT => self.round_rect(&mut cursor)?,
            opcodes::ELLIPSE => self.ellipse(&mut cursor)?,
            opcodes::POLYGON => self.poly(&mut cursor, true)?,
            opcodes::POLYLINE => self.poly(&mut cursor, false)?,
            opcodes::POLYPOLYGON => self.polypolygon(&mut cursor)?,
            opcodes::ARC => self.arc_family(&mut cursor, ArcKind::Arc)?,
            opcodes::CHORD => self.arc_family(&mut cursor, ArcKind::Chord)?,
            opcodes::PIE => self.arc_family(&mut cursor, ArcKind::Pie)?,
            opcodes::TEXTOUT => self.text_out(&mut cursor)?,
            opcodes::EXTTEXTOUT => self.ext_text_out(&mut cursor)?,
            opcodes::SELECTOBJECT => self.select_object(cursor.read_u16()?),
            opcodes::DELETEOBJECT => self.delete_object(cursor.read_u16()?),
            opcodes::CREATEPENINDIRECT => self.create_pen(&mut cursor)?,
            opcodes::CREATEBRUSHINDIRECT => self.create_brush(&mut cursor)?,
            opcodes::CREATEFONTINDIRECT => self.create_font(&mut cursor)?,
            // SETRELABS, SETSTRETCHBLTMODE, SETMAPPERFLAGS, ESCAPE, REALIZEPALETTE,
            // SELECTPALETTE, CREATEPALETTE, SETPALENTRIES, RESIZEPALETTE, ANIMATEPALETTE, and any
            // unrecognized record all fall through here with no effect.
            _ => {}
        }
        Ok(())
    }

    fn move_to(&mut self, cursor: &mut DataCursorRef) -> RResult<()> {
        let (x, y) = read_point_yx(cursor)?;
        self.cur_x = self.coords.scale_x(x as i16);
        self.cur_y = self.coords.scale_y(y as i16);
        Ok(())
    }

    fn line_to(&mut self, cursor: &mut DataCursorRef) -> RResult<()> {
        let (x, y) = read_point_yx(cursor)?;
        let (x2, y2) = (self.coords.scale_x(x as i16), self.coords.scale_y(y as i16));
        let fragment = format!(
            "<{tag} x1=\"{x1:.2}\" y1=\"{y1:.2}\" x2=\"{x2:.2}\" y2=\"{y2:.2}\" {stroke} />",
            tag = self.svg.tag("line"),
            x1 = self.cur_x,
            y1 = self.cur_y,
            stroke = stroke_style(&self.dc, self.coords.scaling),
        );
        self.svg.push_element(&fragment);
        self.cur_x = x2;
        self.cur_y = y2;
        Ok(())
    }

    fn rectangle(&mut self, cursor: &mut DataCursorRef) -> RResult<()> {
        let rect = read_rect(cursor)?;
        let (x, y, w, h) = self.scaled_bounds(rect);
        let fragment = format!(
            "<{tag} x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" {fill} {stroke} />",
            tag = self.svg.tag("rect"),
            fill = fill_style(&self.dc),
            stroke = stroke_style(&self.dc, self.coords.scaling),
        );
        self.svg.push_element(&fragment);
        Ok(())
    }

    fn round_rect(&mut self, cursor: &mut DataCursorRef) -> RResult<()> {
        let corner_h = cursor.read_i16()?;
        let corner_w = cursor.read_i16()?;
        let rect = read_rect(cursor)?;
        let (x, y, w, h) = self.scaled_bounds(rect);
        let rx = self.coords.extent_x(corner_w).abs() / 2.0;
        let ry = self.coords.extent_y(corner_h).abs() / 2.0;
        let fragment = format!(
            "<{tag} x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" rx=\"{rx:.2}\" ry=\"{ry:.2}\" {fill} {stroke} />",
            tag = self.svg.tag("rect"),
            fill = fill_style(&self.dc),
            stroke = stroke_style(&self.dc, self.coords.scaling),
        );
        self.svg.push_element(&fragment);
        Ok(())
    }

    fn ellipse(&mut self, cursor: &mut DataCursorRef) -> RResult<()> {
        let rect = read_rect(cursor)?;
        let (cx, cy, rx, ry) = self.ellipse_geometry(rect);
        let fragment = format!(
            "<{tag} cx=\"{cx:.2}\" cy=\"{cy:.2}\" rx=\"{rx:.2}\" ry=\"{ry:.2}\" {fill} {stroke} />",
            tag = self.svg.tag("ellipse"),
            fill = fill_style(&self.dc),
            stroke = stroke_style(&self.dc, self.coords.scaling),
        );
        self.svg.push_element(&fragment);
        Ok(())
    }

    fn poly(&mut self, cursor: &mut DataCursorRef, is_polygon: bool) -> RResult<()> {
        let points = self.read_scaled_points(cursor)?;
        let tag_name = if is_polygon { "polygon" } else { "polyline" };
        let fill = if is_polygon { fill_style(&self.dc) } else { "fill=\"none\"".to_string() };
        let fragment = format!(
            "<{tag} points=\"{points}\" {fill} {stroke} />",
            tag = self.svg.tag(tag_name),
            stroke = stroke_style(&self.dc, self.coords.scaling),
        );
        self.svg.push_element(&fragment);
        Ok(())
    }

    fn polypolygon(&mut self, cursor: &mut DataCursorRef) -> RResult<()> {
        let polygon_count = usize::from(cursor.read_u16()?);
        let mut counts = Vec::with_capacity(polygon_count);
        for _ in 0..polygon_count {
            counts.push(usize::from(cursor.read_u16()?));
        }

        for count in counts {
            let mut points = String::new();
            for i in 0..count {
                let x = cursor.read_i16()?;
                let y = cursor.read_i16()?;
                if i > 0 {
                    points.push(' ');
                }
                points.push_str(&format!(
                    "{:.2},{:.2}",
                    self.coords.scale_x(x),
                    self.coords.scale_y(y)
                ));
            }
            let fragment = format!(
                "<{tag} points=\"{points}\" {fill} {stroke} />",
                tag = self.svg.tag("polygon"),
                fill = fill_style(&self.dc),
                stroke = stroke_style(&self.dc, self.coords.scaling),
            );
            self.svg.push_element(&fragment);
        }
        Ok(())
    }

    fn arc_family(&mut self, cursor: &mut DataCursorRef, kind: ArcKind) -> RResult<()> {
        let y_end = cursor.read_i16()?;
        let x_end = cursor.read_i16()?;
        let y_start = cursor.read_i16()?;
        let x_start = cursor.read_i16()?;
        let rect = read_rect(cursor)?;

        let (cx, cy, rx, ry) = self.ellipse_geometry(rect);
        let start = (self.coords.scale_x(x_start), self.coords.scale_y(y_start));
        let end = (self.coords.scale_x(x_end), self.coords.scale_y(y_end));

        let start_angle = (start.1 - cy).atan2(start.0 - cx);
        let end_angle = (end.1 - cy).atan2(end.0 - cx);
        let mut sweep = end_angle - start_angle;
        if sweep < 0.0 {
            sweep += 2.0 * core::f64::consts::PI;
        }
        let large_arc = if sweep > core::f64::consts::PI { 1 } else { 0 };

        let (sx, sy) = (cx + rx * start_angle.cos(), cy + ry * start_angle.sin());
        let (ex, ey) = (cx + rx * end_angle.cos(), cy + ry * end_angle.sin());

        let path = match kind {
            ArcKind::Arc => format!("M {sx:.2},{sy:.2} A {rx:.2},{ry:.2} 0 {large_arc} 1 {ex:.2},{ey:.2}"),
            ArcKind::Chord => {
                format!("M {sx:.2},{sy:.2} A {rx:.2},{ry:.2} 0 {large_arc} 1 {ex:.2},{ey:.2} Z")
            }
            ArcKind::Pie => format!(
                "M {cx:.2},{cy:.2} L {sx:.2},{sy:.2} A {rx:.2},{ry:.2} 0 {large_arc} 1 {ex:.2},{ey:.2} Z"
            ),
        };

        let fill = match kind {
            ArcKind::Arc => "fill=\"none\"".to_string(),
            ArcKind::Chord | ArcKind::Pie => fill_style(&self.dc),
        };

        let fragment = format!(
            "<{tag} d=\"{path}\" {fill} {stroke} />",
            tag = self.svg.tag("path"),
            stroke = stroke_style(&self.dc, self.coords.scaling),
        );
        self.svg.push_element(&fragment);
        Ok(())
    }

    fn text_out(&mut self, cursor: &mut DataCursorRef) -> RResult<()> {
        let len = usize::from(cursor.read_u16()?);
        let text = cursor.get_slice(len)?.to_vec();
        if len % 2 != 0 {
            cursor.read_u8()?;
        }
        let (x, y) = read_point_yx(cursor)?;
        self.emit_text(x as i16, y as i16, &text);
        Ok(())
    }

    fn ext_text_out(&mut self, cursor: &mut DataCursorRef) -> RResult<()> {
        let y = cursor.read_i16()?;
        let x = cursor.read_i16()?;
        let len = usize::from(cursor.read_u16()?);
        let options = cursor.read_u16()?;
        if options & (ETO_OPAQUE | ETO_CLIPPED) != 0 {
            // Clipping/opaque rectangle: four i16 fields this interpreter doesn't honor.
            cursor.get_slice(8)?;
        }
        let text = cursor.get_slice(len)?.to_vec();
        self.emit_text(x, y, &text);
        Ok(())
    }

    fn emit_text(&mut self, x: i16, y: i16, text: &[u8]) {
        let (x, y) = (self.coords.scale_x(x), self.coords.scale_y(y));
        let size = {
            let height = f64::from(self.dc.font.height.unsigned_abs()) * self.coords.scaling;
            if height == 0.0 { 12.0 } else { height.max(1.0) }
        };
        let anchor = match self.dc.text_align & TA_CENTER_RIGHT_MASK {
            TA_CENTER => "middle",
            TA_RIGHT => "end",
            _ => "start",
        };

        let mut attrs = format!(
            "fill=\"{}\" font-size=\"{:.2}\" text-anchor=\"{anchor}\"",
            self.dc.text_color.to_hex(),
            size,
        );
        if let Some(face) = self.dc.font.face.as_deref().filter(|f| !f.is_empty()) {
            attrs.push_str(&format!(" font-family=\"{face}\""));
        }
        if self.dc.font.italic {
            attrs.push_str(" font-style=\"italic\"");
        }
        if self.dc.font.weight > 400 {
            attrs.push_str(" font-weight=\"bold\"");
        }

        let fragment = format!(
            "<{tag} x=\"{x:.2}\" y=\"{y:.2}\" {attrs}>{body}</{tag}>",
            tag = self.svg.tag("text"),
            body = escape_text(text),
        );
        self.svg.push_element(&fragment);
    }

    fn select_object(&mut self, handle: u16) {
        match decode_handle(handle) {
            ObjectHandle::Slot(index) => match self.objects.get(index) {
                Some(ObjectSlot::Pen(pen)) => {
                    self.dc.pen_set = true;
                    self.dc.pen = pen.clone();
                }
                Some(ObjectSlot::Brush(brush)) => {
                    self.dc.brush_set = true;
                    self.dc.brush = brush.clone();
                }
                Some(ObjectSlot::Font(font)) => {
                    self.dc.font_set = true;
                    self.dc.font = font.clone();
                }
                _ => {}
            },
            ObjectHandle::Stock(stock) => apply_stock_object(&mut self.dc, stock),
            ObjectHandle::UnknownStock => {}
        }
    }

    fn delete_object(&mut self, handle: u16) {
        if let ObjectHandle::Slot(index) = decode_handle(handle) {
            self.objects.delete(index);
        }
    }

    fn create_pen(&mut self, cursor: &mut DataCursorRef) -> RResult<()> {
        let style: PenStyle = cursor.read_u16()?.into();
        let width = f64::from(cursor.read_i16()?);
        cursor.read_i16()?; // unused y component of the LOGPEN width POINT
        let color = ColorRef::from_colorref(cursor.read_u32()?);
        if self.objects.allocate(ObjectSlot::Pen(Pen { style, color, width })).is_none() {
            log::warn!("object table full, dropping CREATEPENINDIRECT record");
        }
        Ok(())
    }

    fn create_brush(&mut self, cursor: &mut DataCursorRef) -> RResult<()> {
        let style: BrushStyle = cursor.read_u16()?.into();
        let color = ColorRef::from_colorref(cursor.read_u32()?);
        let hatch = cursor.read_u16()?;
        if self.objects.allocate(ObjectSlot::Brush(Brush { style, color, hatch })).is_none() {
            log::warn!("object table full, dropping CREATEBRUSHINDIRECT record");
        }
        Ok(())
    }

    fn create_font(&mut self, cursor: &mut DataCursorRef) -> RResult<()> {
        let height = cursor.read_i16()?;
        let width = cursor.read_i16()?;
        let escapement = cursor.read_i16()?;
        let orientation = cursor.read_i16()?;
        let weight = cursor.read_i16()?;
        let italic = cursor.read_u8()? != 0;
        let underline = cursor.read_u8()? != 0;
        let strikeout = cursor.read_u8()? != 0;
        let charset = cursor.read_u8()?;
        // OutPrecision, ClipPrecision, Quality, PitchAndFamily: recorded but unused downstream.
        cursor.get_slice(4)?;
        let remaining = cursor.remaining_slice();
        let name_len = remaining.iter().position(|&b| b == 0).unwrap_or(remaining.len());
        let face = String::from_utf8_lossy(&remaining[..name_len]).into_owned();

        let font = Font {
            face: (!face.is_empty()).then_some(face),
            height,
            width,
            escapement,
            orientation,
            weight,
            italic,
            underline,
            strikeout,
            charset,
        };
        if self.objects.allocate(ObjectSlot::Font(font)).is_none() {
            log::warn!("object table full, dropping CREATEFONTINDIRECT record");
        }
        Ok(())
    }

    /// Reads a point array prefixed by a 16-bit count, scaling each point through the
    /// coordinate engine into a space-separated `"x,y x,y"` string suitable for `points=`.
    fn read_scaled_points(&self, cursor: &mut DataCursorRef) -> RResult<String> {
        let count = cursor.read_u16()?;
        let mut points = String::new();
        for i in 0..count {
            let x = cursor.read_i16()?;
            let y = cursor.read_i16()?;
            if i > 0 {
                points.push(' ');
            }
            points.push_str(&format!("{:.2},{:.2}", self.coords.scale_x(x), self.coords.scale_y(y)));
        }
        Ok(points)
    }

    /// Scales a device rectangle into `(x, y, width, height)`, normalizing for a reversed or
    /// mirrored rect (right < left, bottom < top).
    fn scaled_bounds(&self, rect: Rect16) -> (f64, f64, f64, f64) {
        let (x1, x2) = (self.coords.scale_x(rect.left), self.coords.scale_x(rect.right));
        let (y1, y2) = (self.coords.scale_y(rect.top), self.coords.scale_y(rect.bottom));
        (x1.min(x2), y1.min(y2), (x2 - x1).abs(), (y2 - y1).abs())
    }

    /// Scales a device rectangle into ellipse `(cx, cy, rx, ry)`.
    fn ellipse_geometry(&self, rect: Rect16) -> (f64, f64, f64, f64) {
        let (x, y, w, h) = self.scaled_bounds(rect);
        (x + w / 2.0, y + h / 2.0, w / 2.0, h / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArcKind {
    Arc,
    Chord,
    Pie,
}

/// Reads a two-coordinate record field stored `Y` before `X`, the order WMF uses for window and
/// viewport origins/extents and for `MOVETO`/`LINETO`, and returns `(x, y)`.
fn read_point_yx(cursor: &mut DataCursorRef) -> RResult<(i32, i32)> {
    let y = cursor.read_i16()?;
    let x = cursor.read_i16()?;
    Ok((i32::from(x), i32::from(y)))
}

/// Reads a rectangle record field, stored in the WMF's reversed order (bottom, right, top, left).
fn read_rect(cursor: &mut DataCursorRef) -> RResult<Rect16> {
    let bottom = cursor.read_i16()?;
    let right = cursor.read_i16()?;
    let top = cursor.read_i16()?;
    let left = cursor.read_i16()?;
    Ok(Rect16::new(left, top, right, bottom))
}

/// Builds the `stroke="..."` (and `stroke-width`/`stroke-dasharray` when applicable) attribute
/// fragment for the device context's current pen.
fn stroke_style(dc: &DeviceContext, scaling: f64) -> String {
    if !dc.pen_set || dc.pen.style == PenStyle::Null {
        return "stroke=\"none\"".to_string();
    }

    let width = (dc.pen.width * scaling).max(1.0);
    let mut style = format!("stroke=\"{}\" stroke-width=\"{:.2}\"", dc.pen.color.to_hex(), width);
    if let Some(pattern) = dash_array(dc.pen.style, width) {
        style.push_str(&format!(" stroke-dasharray=\"{pattern}\""));
    }
    style
}

/// Computes the `stroke-dasharray` pattern for a dashed/dotted pen style at scaled width `w`.
///
/// Unlike `stroke-width`, dash values are formatted with `{}` rather than `{:.2}` — a plain
/// `Display` of `f64` drops trailing zeros, so a width-2 `DASH` pen yields `"6,2"` rather than
/// `"6.00,2.00"`.
fn dash_array(style: PenStyle, w: f64) -> Option<String> {
    match style {
        PenStyle::Dash => Some(format!("{},{}", 3.0 * w, w)),
        PenStyle::Dot => Some(format!("{w},{w}")),
        PenStyle::DashDot => Some(format!("{},{w},{w},{w}", 3.0 * w)),
        PenStyle::DashDotDot => Some(format!("{},{w},{w},{w},{w},{w}", 3.0 * w)),
        _ => None,
    }
}

/// Builds the `fill="..."` (and `fill-rule` when filled) attribute fragment for the device
/// context's current brush and polygon fill mode.
fn fill_style(dc: &DeviceContext) -> String {
    if !dc.brush_set || matches!(dc.brush.style, BrushStyle::Null) {
        return "fill=\"none\"".to_string();
    }

    let rule = if dc.poly_fill_mode == PolyFillMode::Winding { "nonzero" } else { "evenodd" };
    format!("fill=\"{}\" fill-rule=\"{rule}\"", dc.brush.color.to_hex())
}

/// Runs the record demultiplexer over `data[header.record_start..]` and returns the finished SVG
/// document (or bare fragment, per [`ConvertOptions::svg_delimiter`]).
///
/// Malformed individual records are logged (when [`ConvertOptions::verbose`] is set) and skipped;
/// only the declared record size is trusted to advance the cursor, and a record whose declared
/// size would run past the end of the buffer terminates the loop early, per the crate's
/// best-effort rendering policy for partially corrupt files.
#[must_use]
pub fn interpret(data: &[u8], header: &ParsedHeader, options: &ConvertOptions) -> String {
    let (scaling, width, height) =
        coords::compute_scale(header.placeable.as_ref(), options.img_width, options.img_height);

    let mut interp = Interp::new(header.object_count, scaling, &options.name_space);
    interp.svg.header(width, height, options.svg_delimiter);

    let mut pos = header.record_start;
    let mut record_count = 0usize;

    while pos < data.len() && record_count < MAX_RECORDS {
        record_count += 1;

        if data.len() - pos < 6 {
            break;
        }
        let size_words = u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]);
        let size_bytes = (size_words as usize).saturating_mul(2);
        if size_bytes < 6 || pos + size_bytes > data.len() {
            break;
        }

        let i_type = data[pos + 4];
        if i_type == opcodes::EOF {
            break;
        }

        let record = &data[pos..pos + size_bytes];
        if let Err(error) = interp.dispatch(i_type, record) {
            if options.verbose {
                log::warn!("skipping malformed record (iType=0x{i_type:02X}): {error}");
            }
        }

        pos += size_bytes;
    }

    interp.svg.footer();
    interp.svg.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header;

    const PLACEABLE_INCH: u16 = 1440;

    fn push_u16(buf: &mut Vec<u8>, v: u16) {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    fn push_i16(buf: &mut Vec<u8>, v: i16) {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    fn push_u32(buf: &mut Vec<u8>, v: u32) {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Appends one record: `size_words` u32, function code u16 (low byte `i_type`), then `body`.
    fn push_record(buf: &mut Vec<u8>, i_type: u8, body: &[u8]) {
        let size_words = (6 + body.len()) / 2;
        push_u32(buf, size_words as u32);
        push_u16(buf, u16::from(i_type));
        buf.extend_from_slice(body);
    }

    fn placeable_header(bounds: (i16, i16, i16, i16)) -> Vec<u8> {
        let mut data = vec![0u8; 22];
        data[0..4].copy_from_slice(&header::PLACEABLE_MAGIC.to_le_bytes());
        data[6..8].copy_from_slice(&bounds.0.to_le_bytes());
        data[8..10].copy_from_slice(&bounds.1.to_le_bytes());
        data[10..12].copy_from_slice(&bounds.2.to_le_bytes());
        data[12..14].copy_from_slice(&bounds.3.to_le_bytes());
        data[14..16].copy_from_slice(&PLACEABLE_INCH.to_le_bytes());
        data
    }

    fn standard_header() -> Vec<u8> {
        let mut data = vec![0u8; 18];
        data[0] = 0x01;
        data[2..4].copy_from_slice(&9u16.to_le_bytes());
        data[4..6].copy_from_slice(&0x0300u16.to_le_bytes());
        data[10..12].copy_from_slice(&16u16.to_le_bytes()); // NumberOfObjects
        data
    }

    fn wmf_with_records(bounds: (i16, i16, i16, i16), mut records: Vec<u8>) -> Vec<u8> {
        let mut data = placeable_header(bounds);
        data.extend(standard_header());
        data.append(&mut records);
        push_record(&mut data, opcodes::EOF, &[]);
        data
    }

    /// Builds a WMF with no placeable header, so [`coords::compute_scale`] falls back to a
    /// scaling factor of 1 instead of the 96-dpi placeable default.
    fn wmf_without_placeable(mut records: Vec<u8>) -> Vec<u8> {
        let mut data = standard_header();
        data.append(&mut records);
        push_record(&mut data, opcodes::EOF, &[]);
        data
    }

    #[test]
    fn minimal_placeable_and_eof_emits_empty_svg() {
        let data = wmf_with_records((0, 0, 1000, 1000), vec![]);
        let parsed = header::parse(&data).unwrap();
        let options = ConvertOptions::default();
        let svg = interpret(&data, &parsed, &options);
        assert!(svg.contains("<?xml"));
        assert!(svg.contains("<svg"));
        assert!(!svg.contains("<rect"));
        assert!(!svg.contains("<line"));

        // Width/height/viewBox must match the placeable extent scaled to 96 dpi (Inch=1440),
        // i.e. 1000 * 96/1440 ~= 66.67, not just "some <svg> wrapper".
        let (_scaling, width, height) =
            coords::compute_scale(parsed.placeable.as_ref(), options.img_width, options.img_height);
        assert!((width - 66.666_666_666_666_67).abs() < 1e-6);
        assert!((height - 66.666_666_666_666_67).abs() < 1e-6);
        assert!(svg.contains(&format!("width=\"{width}\"")));
        assert!(svg.contains(&format!("height=\"{height}\"")));
        assert!(svg.contains(&format!("viewBox=\"0 0 {width} {height}\"")));
    }

    #[test]
    fn black_rectangle_scenario() {
        let mut records = Vec::new();
        // SETWINDOWORG(0, 0): stored Y, X.
        let mut body = Vec::new();
        push_i16(&mut body, 0);
        push_i16(&mut body, 0);
        push_record(&mut records, opcodes::SETWINDOWORG, &body);

        // SETWINDOWEXT(1000, 1000): stored Y, X (symmetric here).
        let mut body = Vec::new();
        push_i16(&mut body, 1000);
        push_i16(&mut body, 1000);
        push_record(&mut records, opcodes::SETWINDOWEXT, &body);

        // SELECTOBJECT(BLACK_PEN stock handle).
        let mut body = Vec::new();
        push_u16(&mut body, 0x8000 | 7);
        push_record(&mut records, opcodes::SELECTOBJECT, &body);

        // SELECTOBJECT(NULL_BRUSH stock handle).
        let mut body = Vec::new();
        push_u16(&mut body, 0x8000 | 5);
        push_record(&mut records, opcodes::SELECTOBJECT, &body);

        // RECTANGLE(100,100,900,900): stored bottom, right, top, left.
        let mut body = Vec::new();
        push_i16(&mut body, 900); // bottom
        push_i16(&mut body, 900); // right
        push_i16(&mut body, 100); // top
        push_i16(&mut body, 100); // left
        push_record(&mut records, opcodes::RECTANGLE, &body);

        let data = wmf_with_records((0, 0, 1000, 1000), records);
        let parsed = header::parse(&data).unwrap();
        let options = ConvertOptions::default();
        let svg = interpret(&data, &parsed, &options);

        assert!(svg.contains("fill=\"none\""));
        assert!(svg.contains("stroke=\"#000000\""));
        // scaling = 96 / 1440
        assert!(svg.contains("x=\"6.67\""));
        assert!(svg.contains("y=\"6.67\""));
        assert!(svg.contains("width=\"53.33\""));
        assert!(svg.contains("height=\"53.33\""));
    }

    #[test]
    fn dash_pattern_on_lineto() {
        let mut records = Vec::new();

        let mut body = Vec::new();
        push_u16(&mut body, 1); // style = DASH
        push_i16(&mut body, 2); // width
        push_i16(&mut body, 0); // unused
        push_u32(&mut body, 0x0000_00FF); // red (0x00BBGGRR)
        push_record(&mut records, opcodes::CREATEPENINDIRECT, &body);

        let mut body = Vec::new();
        push_u16(&mut body, 0); // slot 0
        push_record(&mut records, opcodes::SELECTOBJECT, &body);

        let mut body = Vec::new();
        push_i16(&mut body, 0); // y
        push_i16(&mut body, 10); // x
        push_record(&mut records, opcodes::LINETO, &body);

        let data = wmf_without_placeable(records);
        let parsed = header::parse(&data).unwrap();
        let options = ConvertOptions { svg_delimiter: false, ..ConvertOptions::default() };
        let svg = interpret(&data, &parsed, &options);

        assert!(svg.contains("stroke=\"#FF0000\""));
        assert!(svg.contains("stroke-width=\"2.00\""));
        assert!(svg.contains("stroke-dasharray=\"6,2\""));
    }

    #[test]
    fn null_pen_stock_object_emits_stroke_none() {
        let mut records = Vec::new();

        // SELECTOBJECT(NULL_PEN stock handle).
        let mut body = Vec::new();
        push_u16(&mut body, 0x8000 | 8);
        push_record(&mut records, opcodes::SELECTOBJECT, &body);

        let mut body = Vec::new();
        push_i16(&mut body, 0); // y
        push_i16(&mut body, 10); // x
        push_record(&mut records, opcodes::LINETO, &body);

        let data = wmf_without_placeable(records);
        let parsed = header::parse(&data).unwrap();
        let options = ConvertOptions::default();
        let svg = interpret(&data, &parsed, &options);

        assert!(svg.contains("<line"));
        assert!(svg.contains("stroke=\"none\""));
    }

    #[test]
    fn save_restore_nesting_uses_correct_pen() {
        let mut records = Vec::new();

        let pen = |records: &mut Vec<u8>, color: u32| {
            let mut body = Vec::new();
            push_u16(&mut body, 0);
            push_i16(&mut body, 1);
            push_i16(&mut body, 0);
            push_u32(&mut body, color);
            push_record(records, opcodes::CREATEPENINDIRECT, &body);
            let mut select = Vec::new();
            push_u16(&mut select, 0);
            push_record(records, opcodes::SELECTOBJECT, &select);
            let mut del = Vec::new();
            push_u16(&mut del, 0);
            push_record(records, opcodes::DELETEOBJECT, &del);
        };

        pen(&mut records, 0x0000_00FF); // red
        push_record(&mut records, opcodes::SAVEDC, &[]);
        pen(&mut records, 0x00FF_0000); // blue
        push_record(&mut records, opcodes::SAVEDC, &[]);
        pen(&mut records, 0x0000_FF00); // green

        let mut body = Vec::new();
        push_i16(&mut body, -2);
        push_record(&mut records, opcodes::RESTOREDC, &body);

        let mut body = Vec::new();
        push_i16(&mut body, 0);
        push_i16(&mut body, 10);
        push_record(&mut records, opcodes::LINETO, &body);

        let data = wmf_with_records((0, 0, 1000, 1000), records);
        let parsed = header::parse(&data).unwrap();
        let options = ConvertOptions::default();
        let svg = interpret(&data, &parsed, &options);

        assert!(svg.contains("stroke=\"#FF0000\""));
    }

    #[test]
    fn polygon_winding_fill_rule() {
        let mut records = Vec::new();

        let mut body = Vec::new();
        push_u16(&mut body, 2); // WINDING
        push_record(&mut records, opcodes::SETPOLYFILLMODE, &body);

        let mut body = Vec::new();
        push_u16(&mut body, 4);
        for (x, y) in [(0i16, 0i16), (100, 0), (0, 100), (100, 100)] {
            push_i16(&mut body, x);
            push_i16(&mut body, y);
        }
        push_record(&mut records, opcodes::POLYGON, &body);

        let data = wmf_with_records((0, 0, 1000, 1000), records);
        let parsed = header::parse(&data).unwrap();
        let options = ConvertOptions::default();
        let svg = interpret(&data, &parsed, &options);

        assert!(svg.contains("<polygon"));
        assert!(svg.contains("fill-rule=\"nonzero\""));
    }

    #[test]
    fn text_alignment_and_escaping() {
        let mut records = Vec::new();

        let mut body = Vec::new();
        push_u16(&mut body, TA_CENTER);
        push_record(&mut records, opcodes::SETTEXTALIGN, &body);

        let text = b"A&B";
        let mut body = Vec::new();
        push_u16(&mut body, text.len() as u16);
        body.extend_from_slice(text);
        body.push(0); // pad the odd-length string to a word boundary
        push_i16(&mut body, 500); // y
        push_i16(&mut body, 500); // x
        push_record(&mut records, opcodes::TEXTOUT, &body);

        let data = wmf_with_records((0, 0, 1000, 1000), records);
        let parsed = header::parse(&data).unwrap();
        let options = ConvertOptions::default();
        let svg = interpret(&data, &parsed, &options);

        assert!(svg.contains("text-anchor=\"middle\""));
        assert!(svg.contains("A&amp;B"));
    }

    #[test]
    fn record_count_cap_terminates_pathological_input() {
        let mut records = Vec::new();
        for _ in 0..(MAX_RECORDS + 10) {
            push_record(&mut records, 0xAB, &[]); // unrecognized, 6-byte no-op record
        }
        let data = wmf_with_records((0, 0, 1000, 1000), records);
        let parsed = header::parse(&data).unwrap();
        let options = ConvertOptions::default();
        // Must terminate rather than loop forever or panic.
        let _ = interpret(&data, &parsed, &options);
    }
}
