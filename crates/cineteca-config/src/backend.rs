use crate::paths::{CinetecaPaths, ConfigError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;

// toml_edit para escribir sin perder los comentarios del usuario
use toml_edit::{DocumentMut, Item};

pub trait ConfigBackend {
  fn load_section<T: DeserializeOwned>(&self, section: &str) -> Result<T, ConfigError>;
  fn save_section<T: Serialize>(&self, section: &str, value: &T) -> Result<(), ConfigError>;
}

pub struct TomlConfigBackend {
  paths: CinetecaPaths,
}

impl TomlConfigBackend {
  pub fn new(paths: CinetecaPaths) -> Self {
    Self { paths }
  }

  pub fn paths(&self) -> &CinetecaPaths {
    &self.paths
  }

  /// Como [`ConfigBackend::load_section`], pero un archivo o una sección
  /// ausentes devuelven `T::default()` en vez de error.
  pub fn load_section_with_default<T>(&self, section: &str) -> Result<T, ConfigError>
  where
    T: DeserializeOwned + Default,
  {
    let Some(table) = self.read_table()? else {
      return Ok(T::default());
    };

    let Some(value) = table.get(section) else {
      return Ok(T::default());
    };

    decode_section(section, value)
  }

  fn read_table(&self) -> Result<Option<toml::Table>, ConfigError> {
    let content = match fs::read_to_string(self.paths.config_file()) {
      Ok(c) => c,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(e.into()),
    };

    Ok(Some(toml::from_str::<toml::Table>(&content)?))
  }
}

fn decode_section<T: DeserializeOwned>(section: &str, value: &toml::Value) -> Result<T, ConfigError> {
  value
    .clone()
    .try_into()
    .map_err(|e| ConfigError::Other(format!("decode section [{section}]: {e}")))
}

impl ConfigBackend for TomlConfigBackend {
  fn load_section<T: DeserializeOwned>(&self, section: &str) -> Result<T, ConfigError> {
    let path = self.paths.config_file();
    let table = self
      .read_table()?
      .ok_or_else(|| ConfigError::Other(format!("config file {} not found", path.display())))?;

    let value = table
      .get(section)
      .ok_or_else(|| ConfigError::Other(format!("missing section [{section}] in {}", path.display())))?;

    decode_section(section, value)
  }

  fn save_section<T: Serialize>(&self, section: &str, value: &T) -> Result<(), ConfigError> {
    let path = self.paths.config_file();

    // 1) Documento actual, o uno vacío si todavía no existe.
    let mut doc: DocumentMut = match fs::read_to_string(&path) {
      Ok(content) => content
        .parse::<DocumentMut>()
        .map_err(|e| ConfigError::Other(format!("parse toml_edit doc: {e}")))?,
      Err(e) if e.kind() == ErrorKind::NotFound => DocumentMut::new(),
      Err(e) => return Err(e.into()),
    };

    // 2) La sección se serializa sola ("foo = 1\nbar = 2\n") y se reinyecta
    //    como tabla, así el resto del archivo queda intacto.
    let section_str = toml::to_string(value)
      .map_err(|e| ConfigError::Other(format!("encode section [{section}]: {e}")))?;

    let section_doc = section_str
      .parse::<DocumentMut>()
      .map_err(|e| ConfigError::Other(format!("parse section as doc: {e}")))?;

    doc[section] = Item::Table(section_doc.as_table().clone());

    crate::atomic::atomic_write_str(&path, &doc.to_string())?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde::Deserialize;
  use tempfile::tempdir;

  #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
  struct Sample {
    name: String,
    retries: u32,
    token: Option<String>,
  }

  fn backend_in(dir: &std::path::Path) -> TomlConfigBackend {
    TomlConfigBackend::new(CinetecaPaths::rooted(dir).unwrap())
  }

  #[test]
  fn missing_file_yields_default() {
    let tmp = tempdir().unwrap();
    let backend = backend_in(tmp.path());

    let loaded: Sample = backend.load_section_with_default("sample").unwrap();
    assert_eq!(loaded, Sample::default());
    assert!(backend.load_section::<Sample>("sample").is_err());
  }

  #[test]
  fn save_then_load_section() {
    let tmp = tempdir().unwrap();
    let backend = backend_in(tmp.path());
    let value = Sample { name: "tmdb".into(), retries: 3, token: None };

    backend.save_section("sample", &value).unwrap();

    let loaded: Sample = backend.load_section("sample").unwrap();
    assert_eq!(loaded, value);
  }

  #[test]
  fn save_preserves_other_sections_and_comments() {
    let tmp = tempdir().unwrap();
    let backend = backend_in(tmp.path());
    let original = "# ajustes del usuario\n[other]\nkeep = true\n";
    fs::write(backend.paths().config_file(), original).unwrap();

    backend.save_section("sample", &Sample { name: "x".into(), retries: 1, token: None }).unwrap();

    let content = fs::read_to_string(backend.paths().config_file()).unwrap();
    assert!(content.contains("# ajustes del usuario"));
    assert!(content.contains("keep = true"));
    assert!(content.contains("[sample]"));
  }
}
