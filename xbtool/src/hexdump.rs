const WIDTH: usize = 0x10;

/// One row of a dump, `offset` bytes into the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Row<'a> {
    offset: usize,
    data: &'a [u8],
}

/// A row, or a marker standing in for a run of identical rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DumpRow<'a> {
    Data(Row<'a>),
    Repeated,
}

pub fn printable(chr: u8) -> Option<char> {
    if (0x20..0x7f).contains(&chr) {
        Some(chr as char)
    } else {
        None
    }
}

impl<'a> std::fmt::Display for Row<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:04x}", self.offset)?;

        // final row only marks the length
        if self.data.is_empty() {
            return Ok(());
        }

        for i in 0..WIDTH {
            if i % 8 == 0 {
                write!(f, " ")?;
            }
            match self.data.get(i) {
                Some(b) => write!(f, " {:02x}", b)?,
                None => write!(f, "   ")?,
            }
        }

        write!(f, "  |")?;
        for b in self.data {
            write!(f, "{}", printable(*b).unwrap_or('.'))?;
        }
        write!(f, "|")
    }
}

impl<'a> std::fmt::Display for DumpRow<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Data(row) => row.fmt(f),
            Self::Repeated => write!(f, "*"),
        }
    }
}

/// Rows of a dump, collapsing repeats, ending with a bare offset row.
#[derive(Debug, Clone)]
pub struct Rows<'a> {
    data: &'a [u8],
    offset: usize,
    last: Option<&'a [u8]>,
    repeating: bool,
    done: bool,
}

impl<'a> Rows<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            last: None,
            repeating: false,
            done: false,
        }
    }
}

impl<'a> Iterator for Rows<'a> {
    type Item = DumpRow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.offset < self.data.len() {
            let start = self.offset;
            let end = (start + WIDTH).min(self.data.len());
            let chunk = &self.data[start..end];
            self.offset = end;

            if self.last == Some(chunk) {
                if !self.repeating {
                    self.repeating = true;
                    return Some(DumpRow::Repeated);
                }
            } else {
                self.last = Some(chunk);
                self.repeating = false;
                return Some(DumpRow::Data(Row {
                    offset: start,
                    data: chunk,
                }));
            }
        }

        if self.done {
            return None;
        }
        self.done = true;
        Some(DumpRow::Data(Row {
            offset: self.data.len(),
            data: &[],
        }))
    }
}

pub fn hexdump_prefix(prefix: &str, data: &[u8]) {
    for row in Rows::new(data) {
        println!("{}{}", prefix, row);
    }
}

pub fn ehexdump_prefix(prefix: &str, data: &[u8]) {
    for row in Rows::new(data) {
        eprintln!("{}{}", prefix, row);
    }
}

pub fn hexdump_format(data: &[u8]) -> String {
    let mut out = String::new();
    for row in Rows::new(data) {
        out += &format!("{}\n", row);
    }
    out
}
