//! CLI 格式化输出
//!
//! 提供命令行友好的变量、属性列表和错误显示。

use std::io::{self, Write};

use probe_api::{AttributeSink, FieldSink, ProbeError, Rendered};
use probe_core::value::format_float;

/// 属性逐行输出，溢出时输出 `...`
pub struct ConsoleAttributes<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> ConsoleAttributes<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// 结束输出；返回写入过程中遇到的第一个错误
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn emit(&mut self, text: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = writeln!(self.out, "{}", text) {
            self.error = Some(err);
        }
    }
}

impl<W: Write> AttributeSink for ConsoleAttributes<W> {
    fn attribute(&mut self, name: &str) {
        self.emit(name);
    }

    fn separator(&mut self) {}

    fn terminator(&mut self) {}

    fn overflow(&mut self) {
        self.emit("...");
    }
}

/// 按 `path: type = value [scope]` 格式写出变量
pub fn write_variable<W: Write>(
    out: &mut W,
    path: &str,
    fields: &FieldSink,
    rendered: Rendered,
) -> io::Result<()> {
    if let Some(value) = fields.float {
        return writeln!(
            out,
            "{}: float = {} [{}]",
            path,
            format_float(value),
            fields.scope_text.as_str()
        );
    }

    let value = match rendered {
        Rendered::TimedOut => "<timed out>",
        _ => fields.value_text.as_str(),
    };
    write!(out, "{}: {} = {}", path, fields.type_text.as_str(), value)?;
    if fields.scope_text.as_str().is_empty() {
        writeln!(out)
    } else {
        writeln!(out, " [{}]", fields.scope_text.as_str())
    }
}

pub fn print_variable(path: &str, fields: &FieldSink, rendered: Rendered) -> io::Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write_variable(&mut lock, path, fields, rendered)
}

/// 打印错误；`json` 为真时输出结构化报告
pub fn print_error(e: &ProbeError, json: bool) {
    let report = e.to_report();
    if json {
        eprintln!("{}", report.to_json());
    } else {
        eprintln!("❌ {}", report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probe_api::LookupSink;

    #[test]
    fn test_console_attributes_overflow() {
        let mut sink = ConsoleAttributes::new(Vec::new());
        sink.attribute("rpm");
        sink.separator();
        sink.attribute("port");
        sink.overflow();
        let out = sink.finish().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "rpm\nport\n...\n");
    }

    #[test]
    fn test_write_variable_text() {
        let mut fields = FieldSink::new(16, 32);
        fields.type_name("int");
        fields.terminator();
        fields.value("42");
        fields.terminator();
        fields.type_name("step");
        fields.terminator();

        let mut out = Vec::new();
        write_variable(&mut out, "x", &fields, Rendered::Complete).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "x: int = 42 [step]\n");
    }

    #[test]
    fn test_write_variable_float() {
        let mut fields = FieldSink::new(16, 32);
        fields.float(2.0);
        fields.type_name("<module>");
        fields.terminator();

        let mut out = Vec::new();
        write_variable(&mut out, "ratio", &fields, Rendered::Numeric).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ratio: float = 2.0 [<module>]\n");
    }

    #[test]
    fn test_write_variable_timeout() {
        let mut fields = FieldSink::new(16, 32);
        fields.type_name("Hang");
        fields.terminator();
        fields.timeout();

        let mut out = Vec::new();
        write_variable(&mut out, "h", &fields, Rendered::TimedOut).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "h: Hang = <timed out>\n");
    }
}
