//! The push side of the format protocol, mirroring [`NbtReader`].
//!
//! [`NbtReader`]: crate::NbtReader

use crate::error::Result;
use crate::value::Value;
use crate::Tag;

/// Push-based emission of one NBT document in some dialect.
///
/// `begin_list` takes the element tag and size up front; callers that only
/// learn the tag from the first element (the structural engine) defer the
/// call until then. `begin_*_entry` must be called before every collection
/// element so text dialects can place separators.
pub trait NbtWriter {
    fn begin_root_tag(&mut self, tag: Tag, name: &str) -> Result<()>;

    fn begin_compound(&mut self) -> Result<()>;
    fn begin_compound_entry(&mut self, tag: Tag, name: &str) -> Result<()>;
    fn end_compound(&mut self) -> Result<()>;

    fn begin_list(&mut self, element_tag: Tag, size: i32) -> Result<()>;
    fn begin_list_entry(&mut self) -> Result<()>;
    fn end_list(&mut self) -> Result<()>;

    fn begin_byte_array(&mut self, size: i32) -> Result<()>;
    fn begin_byte_array_entry(&mut self) -> Result<()>;
    fn end_byte_array(&mut self) -> Result<()>;

    fn begin_int_array(&mut self, size: i32) -> Result<()>;
    fn begin_int_array_entry(&mut self) -> Result<()>;
    fn end_int_array(&mut self) -> Result<()>;

    fn begin_long_array(&mut self, size: i32) -> Result<()>;
    fn begin_long_array_entry(&mut self) -> Result<()>;
    fn end_long_array(&mut self) -> Result<()>;

    fn write_byte(&mut self, value: i8) -> Result<()>;
    fn write_short(&mut self, value: i16) -> Result<()>;
    fn write_int(&mut self, value: i32) -> Result<()>;
    fn write_long(&mut self, value: i64) -> Result<()>;
    fn write_float(&mut self, value: f32) -> Result<()>;
    fn write_double(&mut self, value: f64) -> Result<()>;
    fn write_string(&mut self, value: &str) -> Result<()>;

    /// Emit an owned tree as the payload of its own tag.
    fn write_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Byte(v) => self.write_byte(*v),
            Value::Short(v) => self.write_short(*v),
            Value::Int(v) => self.write_int(*v),
            Value::Long(v) => self.write_long(*v),
            Value::Float(v) => self.write_float(*v),
            Value::Double(v) => self.write_double(*v),
            Value::String(v) => self.write_string(v),
            Value::ByteArray(data) => {
                self.begin_byte_array(data.len() as i32)?;
                for v in data {
                    self.begin_byte_array_entry()?;
                    self.write_byte(*v)?;
                }
                self.end_byte_array()
            }
            Value::IntArray(data) => {
                self.begin_int_array(data.len() as i32)?;
                for v in data {
                    self.begin_int_array_entry()?;
                    self.write_int(*v)?;
                }
                self.end_int_array()
            }
            Value::LongArray(data) => {
                self.begin_long_array(data.len() as i32)?;
                for v in data {
                    self.begin_long_array_entry()?;
                    self.write_long(*v)?;
                }
                self.end_long_array()
            }
            Value::List(list) => {
                self.begin_list(list.element_tag(), list.len() as i32)?;
                for v in list {
                    self.begin_list_entry()?;
                    self.write_value(v)?;
                }
                self.end_list()
            }
            Value::Compound(map) => {
                self.begin_compound()?;
                for (name, v) in map {
                    self.begin_compound_entry(v.tag(), name)?;
                    self.write_value(v)?;
                }
                self.end_compound()
            }
        }
    }
}
