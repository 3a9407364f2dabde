use std::io::{self, BufRead, StdinLock, Stdout, Write};

/// Side-effect channels supplied by whoever runs a program.
///
/// `output` receives every rendered `say` value in emission order. `input`
/// is called once per `input()` call with the rendered prompt and blocks
/// evaluation until it returns.
pub trait Io {
    fn output(&mut self, text: &str) -> io::Result<()>;

    fn input(&mut self, prompt: &str) -> io::Result<String>;
}

impl<T: Io + ?Sized> Io for &mut T {
    fn output(&mut self, text: &str) -> io::Result<()> {
        (**self).output(text)
    }

    fn input(&mut self, prompt: &str) -> io::Result<String> {
        (**self).input(prompt)
    }
}

/// Line-oriented I/O over a reader and a writer.
#[derive(Debug)]
pub struct Console<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl Console<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Io for Console<R, W> {
    fn output(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.writer, "{text}")
    }

    fn input(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.writer, "{prompt}")?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input stream closed"));
        }
        let len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(len);
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn console_prompts_and_reads_a_line() {
        let mut console = Console::new("Ava\r\nBen\n".as_bytes(), Vec::new());
        assert_eq!(console.input("Name: ").unwrap(), "Ava");
        console.output("Welcome, Ava").unwrap();
        assert_eq!(console.input("> ").unwrap(), "Ben");
        assert_eq!(console.input("> ").unwrap_err().kind(), io::ErrorKind::UnexpectedEof);

        let (_, writer) = console.into_inner();
        assert_eq!(String::from_utf8(writer).unwrap(), "Name: Welcome, Ava\n> > ");
    }
}
