use std::{
    fmt::Display,
    fs::File,
    io::{BufWriter, Error, Write},
    path::Path,
};

pub(crate) trait SavablePoint {
    fn write_to(&self, writer: &mut impl Write) -> Result<(), Error>;
}

impl<T, E> SavablePoint for (T, E)
where
    T: Display,
    E: Display,
{
    fn write_to(&self, writer: &mut impl Write) -> Result<(), Error> {
        writeln!(writer, "{0},{1}", self.0, self.1)
    }
}

/// Writes every item of an iterator to a file, one `index,value` line each.
pub(crate) trait SaveToFileFilter<I>
where
    I: Iterator,
    I::Item: SavablePoint,
{
    fn save_to_file(self, path: &Path) -> Result<(), Error>;
}

impl<I> SaveToFileFilter<I> for I
where
    I: Iterator,
    I::Item: SavablePoint,
{
    fn save_to_file(self, path: &Path) -> Result<(), Error> {
        let mut writer = BufWriter::new(File::create(path)?);
        for item in self {
            item.write_to(&mut writer)?;
        }
        writer.flush()
    }
}
