use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Escribe `contents` en `path` sin dejar nunca un archivo a medias.
///
/// Se escribe primero en un hermano `<nombre>.tmp`, se hace `fsync` y luego
/// `rename`, que en el mismo filesystem es atómico. El directorio padre se
/// crea si no existe.
pub fn atomic_write_str(path: &Path, contents: &str) -> io::Result<()> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent)?;
  }

  let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
  tmp_name.push(".tmp");
  let tmp_path = path.with_file_name(tmp_name);

  let written = (|| {
    let mut tmp_file = fs::File::create(&tmp_path)?;
    tmp_file.write_all(contents.as_bytes())?;
    tmp_file.sync_all()
  })();

  if let Err(e) = written {
    let _ = fs::remove_file(&tmp_path);
    return Err(e);
  }

  fs::rename(&tmp_path, path)
}
