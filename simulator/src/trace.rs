use dpsa_common::Sample;
use std::{
    fs::File,
    io::{BufWriter, Error, Write},
    path::Path,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedTrace {
    pub pedestal: f64,
    pub samples: Vec<Sample>,
}

impl SimulatedTrace {
    /// Writes a `# pedestal=` header followed by one `index,value` line per sample.
    pub fn write_to(&self, writer: &mut impl Write) -> Result<(), Error> {
        writeln!(writer, "# pedestal={}", self.pedestal)?;
        for (index, sample) in self.samples.iter().enumerate() {
            writeln!(writer, "{index},{sample}")?;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()
    }
}
