//! Hand-maintained description of the production database
//!
//! Injected verbatim into every planning prompt. Keep in sync with the
//! tables in `RDP_DAILY` by hand; nothing introspects the live schema.

pub const SCHEMA_DESCRIPTION: &str = r#"Tablas principales (MySQL):

D_RDP_TORNILLOS (
  FECHA DATE,
  COD_PLANTA INT,
  COD_TIPO_TORNILLO INT,
  COD_TURNO INT,
  COD_MAQUINA INT,
  COD_OPERARIO INT,
  CANTIDAD_PRODUCIDA INT,
  CANTIDAD_RECHAZADA INT,
  TIEMPO_MAQUINA_H DECIMAL(6,2),
  TIEMPO_PARADAS_H DECIMAL(6,2)
)

DIM_PLANTA (
  COD_PLANTA INT,
  NOMBRE_PLANTA VARCHAR,
  PAIS VARCHAR,
  PROVINCIA VARCHAR,
  CIUDAD VARCHAR
)

DIM_TIPO_TORNILLO (
  COD_TIPO_TORNILLO INT,
  DESCRIPCION VARCHAR,
  MATERIAL VARCHAR
)

DIM_TURNO (
  COD_TURNO INT,
  NOMBRE_TURNO VARCHAR
)"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describes_all_tables() {
        for table in [
            "D_RDP_TORNILLOS",
            "DIM_PLANTA",
            "DIM_TIPO_TORNILLO",
            "DIM_TURNO",
        ] {
            assert!(SCHEMA_DESCRIPTION.contains(table), "missing {}", table);
        }
    }
}
