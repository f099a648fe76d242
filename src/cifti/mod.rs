//! Single-file NIfTI-2 containers as used by CIFTI (`.dscalar.nii`,
//! `.dlabel.nii`).
//!
//! Layout:
//! ```text
//!  0      540        544                       vox_offset
//!  ├──────┼──────────┼─────────────────────────┼──────────────
//!  header  extender   (esize, ecode, payload)*  data
//! ```
//! The CIFTI XML lives in the extension with code 32. Only little-endian
//! files are handled; Workbench writes nothing else.

pub mod label_table;

use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::CiftiError;

pub const HEADER_SIZE: usize = 540;
const EXTENDER_SIZE: usize = 4;
const MAGIC: &[u8; 8] = b"n+2\0\r\n\x1a\n";

/// Extension code reserved for CIFTI XML.
pub const ECODE_CIFTI: i32 = 32;
/// NIfTI datatype code for 32-bit floats.
pub const DT_FLOAT32: i16 = 16;

/// NIfTI-2 header field byte offsets.
mod offsets {
    pub const SIZEOF_HDR: usize = 0;
    pub const MAGIC: usize = 4;
    pub const DATATYPE: usize = 12;
    pub const BITPIX: usize = 14;
    pub const DIM: usize = 16;
    pub const PIXDIM: usize = 104;
    pub const VOX_OFFSET: usize = 168;
    pub const SCL_SLOPE: usize = 176;
    pub const INTENT_CODE: usize = 504;
    pub const INTENT_NAME: usize = 508;
}

/// CIFTI file flavours this crate writes from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    DenseScalar,
    DenseLabel,
}

impl Intent {
    fn code(self) -> i32 {
        match self {
            Intent::DenseScalar => 3006,
            Intent::DenseLabel => 3007,
        }
    }

    fn name(self) -> &'static [u8] {
        match self {
            Intent::DenseScalar => b"ConnDenseScalar",
            Intent::DenseLabel => b"ConnDenseLabel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub code: i32,
    pub payload: Vec<u8>,
}

/// An in-memory NIfTI-2 file: raw header, extensions and data block.
#[derive(Debug, Clone)]
pub struct CiftiFile {
    header: Vec<u8>,
    extensions: Vec<Extension>,
    data: Vec<u8>,
}

impl CiftiFile {
    pub fn read(path: &Path) -> Result<Self, CiftiError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn write(&self, path: &Path) -> Result<(), CiftiError> {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CiftiError> {
        if bytes.len() < HEADER_SIZE {
            return Err(CiftiError::Truncated(bytes.len()));
        }
        let sizeof_hdr = LittleEndian::read_i32(&bytes[offsets::SIZEOF_HDR..]);
        if sizeof_hdr != HEADER_SIZE as i32 {
            if BigEndian::read_i32(&bytes[offsets::SIZEOF_HDR..]) == HEADER_SIZE as i32 {
                return Err(CiftiError::BigEndian);
            }
            return Err(CiftiError::BadMagic);
        }
        if &bytes[offsets::MAGIC..offsets::MAGIC + 8] != MAGIC {
            return Err(CiftiError::BadMagic);
        }

        let vox_offset = LittleEndian::read_i64(&bytes[offsets::VOX_OFFSET..]);
        let vox_offset = usize::try_from(vox_offset)
            .ok()
            .filter(|&v| v >= HEADER_SIZE && v <= bytes.len())
            .ok_or(CiftiError::Truncated(bytes.len()))?;

        let mut extensions = Vec::new();
        let has_extensions =
            bytes.len() >= HEADER_SIZE + EXTENDER_SIZE && bytes[HEADER_SIZE] != 0;
        if has_extensions {
            let mut offset = HEADER_SIZE + EXTENDER_SIZE;
            while offset + 8 <= vox_offset {
                let esize = LittleEndian::read_i32(&bytes[offset..]);
                let code = LittleEndian::read_i32(&bytes[offset + 4..]);
                let size = usize::try_from(esize).unwrap_or(0);
                if size < 16 || size % 16 != 0 || offset + size > vox_offset {
                    return Err(CiftiError::BadExtension { offset, esize });
                }
                extensions.push(Extension {
                    code,
                    payload: bytes[offset + 8..offset + size].to_vec(),
                });
                offset += size;
            }
        }

        Ok(CiftiFile {
            header: bytes[..HEADER_SIZE].to_vec(),
            extensions,
            data: bytes[vox_offset..].to_vec(),
        })
    }

    /// Serialize, padding extensions to 16 bytes and recomputing `vox_offset`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let ext_sizes: Vec<usize> = self
            .extensions
            .iter()
            .map(|e| (e.payload.len() + 8).div_ceil(16) * 16)
            .collect();
        let vox_offset = HEADER_SIZE + EXTENDER_SIZE + ext_sizes.iter().sum::<usize>();

        let mut out = Vec::with_capacity(vox_offset + self.data.len());
        out.extend_from_slice(&self.header);
        LittleEndian::write_i64(&mut out[offsets::VOX_OFFSET..], vox_offset as i64);

        let extender = if self.extensions.is_empty() { 0 } else { 1 };
        out.extend_from_slice(&[extender, 0, 0, 0]);

        for (ext, &size) in self.extensions.iter().zip(&ext_sizes) {
            let mut head = [0u8; 8];
            LittleEndian::write_i32(&mut head[..4], size as i32);
            LittleEndian::write_i32(&mut head[4..], ext.code);
            out.extend_from_slice(&head);
            out.extend_from_slice(&ext.payload);
            out.resize(out.len() + size - 8 - ext.payload.len(), 0);
        }

        out.extend_from_slice(&self.data);
        out
    }

    /// Build a FLOAT32 CIFTI file with the given matrix shape
    /// (`[maps, grayordinates]`), XML and values.
    pub fn new_float32(
        intent: Intent,
        shape: [usize; 2],
        xml: &str,
        values: &[f32],
    ) -> Result<Self, CiftiError> {
        let mut header = vec![0u8; HEADER_SIZE];
        LittleEndian::write_i32(&mut header[offsets::SIZEOF_HDR..], HEADER_SIZE as i32);
        header[offsets::MAGIC..offsets::MAGIC + 8].copy_from_slice(MAGIC);
        LittleEndian::write_i16(&mut header[offsets::DATATYPE..], DT_FLOAT32);
        LittleEndian::write_i16(&mut header[offsets::BITPIX..], 32);

        let dims: [i64; 8] = [6, 1, 1, 1, 1, shape[0] as i64, shape[1] as i64, 1];
        for (i, d) in dims.iter().enumerate() {
            LittleEndian::write_i64(&mut header[offsets::DIM + i * 8..], *d);
            LittleEndian::write_f64(&mut header[offsets::PIXDIM + i * 8..], 1.0);
        }
        LittleEndian::write_f64(&mut header[offsets::SCL_SLOPE..], 1.0);
        LittleEndian::write_i32(&mut header[offsets::INTENT_CODE..], intent.code());
        let name = intent.name();
        header[offsets::INTENT_NAME..offsets::INTENT_NAME + name.len()].copy_from_slice(name);

        let mut file = CiftiFile {
            header,
            extensions: vec![Extension {
                code: ECODE_CIFTI,
                payload: xml.as_bytes().to_vec(),
            }],
            data: vec![0u8; shape[0] * shape[1] * 4],
        };
        file.set_scalars(values)?;
        Ok(file)
    }

    pub fn datatype(&self) -> i16 {
        LittleEndian::read_i16(&self.header[offsets::DATATYPE..])
    }

    pub fn dims(&self) -> [i64; 8] {
        let mut dims = [0i64; 8];
        LittleEndian::read_i64_into(&self.header[offsets::DIM..offsets::DIM + 64], &mut dims);
        dims
    }

    /// Number of data elements: the product of `dim[1..=dim[0]]`.
    pub fn element_count(&self) -> usize {
        let dims = self.dims();
        let rank = dims[0].clamp(0, 7) as usize;
        dims[1..=rank]
            .iter()
            .map(|&d| usize::try_from(d).unwrap_or(0))
            .product()
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    pub fn scalars(&self) -> Result<Vec<f32>, CiftiError> {
        self.require_float32()?;
        let n = self.element_count();
        if self.data.len() < n * 4 {
            return Err(CiftiError::LengthMismatch {
                expected: n,
                actual: self.data.len() / 4,
            });
        }
        let mut out = vec![0f32; n];
        LittleEndian::read_f32_into(&self.data[..n * 4], &mut out);
        Ok(out)
    }

    /// Overwrite every data element. `values` must match the element count.
    pub fn set_scalars(&mut self, values: &[f32]) -> Result<(), CiftiError> {
        self.require_float32()?;
        let n = self.element_count();
        if values.len() != n {
            return Err(CiftiError::LengthMismatch {
                expected: n,
                actual: values.len(),
            });
        }
        self.data.resize(n * 4, 0);
        LittleEndian::write_f32_into(values, &mut self.data[..n * 4]);
        Ok(())
    }

    pub fn cifti_xml(&self) -> Result<&str, CiftiError> {
        let ext = self
            .extensions
            .iter()
            .find(|e| e.code == ECODE_CIFTI)
            .ok_or(CiftiError::MissingXml)?;
        let end = ext
            .payload
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |i| i + 1);
        std::str::from_utf8(&ext.payload[..end]).map_err(|_| CiftiError::XmlEncoding)
    }

    pub fn set_cifti_xml(&mut self, xml: String) -> Result<(), CiftiError> {
        let ext = self
            .extensions
            .iter_mut()
            .find(|e| e.code == ECODE_CIFTI)
            .ok_or(CiftiError::MissingXml)?;
        ext.payload = xml.into_bytes();
        Ok(())
    }

    fn require_float32(&self) -> Result<(), CiftiError> {
        match self.datatype() {
            DT_FLOAT32 => Ok(()),
            other => Err(CiftiError::UnsupportedDataType(other)),
        }
    }
}
