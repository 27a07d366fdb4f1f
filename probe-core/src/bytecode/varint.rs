//! 变长整数编码 (LEB128 + ZigZag)

use super::CodeError;

/// 编码无符号变长整数 (LEB128 风格)
pub fn encode_uint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// 解码无符号变长整数，返回 (值, 读取字节数)
pub fn decode_uint(bytes: &[u8]) -> Result<(u64, usize), CodeError> {
    let mut result = 0u64;
    let mut shift = 0;
    let mut offset = 0;

    loop {
        let Some(&byte) = bytes.get(offset) else {
            return Err(CodeError::Truncated);
        };
        offset += 1;

        result |= ((byte & 0x7F) as u64) << shift;

        if (byte & 0x80) == 0 {
            break;
        }

        shift += 7;
        if shift >= 64 {
            return Err(CodeError::VarintOverflow);
        }
    }

    Ok((result, offset))
}

/// 编码有符号变长整数 (ZigZag + LEB128)
pub fn encode_sint(buf: &mut Vec<u8>, value: i64) {
    let encoded = ((value << 1) ^ (value >> 63)) as u64;
    encode_uint(buf, encoded);
}

/// 解码有符号变长整数
pub fn decode_sint(bytes: &[u8]) -> Result<(i64, usize), CodeError> {
    let (encoded, read) = decode_uint(bytes)?;
    let value = ((encoded >> 1) as i64) ^ -((encoded & 1) as i64);
    Ok((value, read))
}

/// 顺序读取变长整数的游标
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_at_end(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    pub fn read_uint(&mut self) -> Result<u64, CodeError> {
        let rest = self.bytes.get(self.offset..).ok_or(CodeError::Truncated)?;
        let (value, read) = decode_uint(rest)?;
        self.offset += read;
        Ok(value)
    }

    /// 读取无符号整数并转换为 usize
    pub fn read_usize(&mut self) -> Result<usize, CodeError> {
        let value = self.read_uint()?;
        usize::try_from(value).map_err(|_| CodeError::VarintOverflow)
    }

    pub fn read_sint(&mut self) -> Result<i64, CodeError> {
        let rest = self.bytes.get(self.offset..).ok_or(CodeError::Truncated)?;
        let (value, read) = decode_sint(rest)?;
        self.offset += read;
        Ok(value)
    }
}
