//! abapGit interchange file scenarios.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sapcli_xml::{
        CodecConfig, InterchangeWriter, Record, RecordType, Table, TypeRef, XmlError,
        from_interchange_xml, from_interchange_xml_with_config, record_from_xml,
    };

    use crate::registry;

    fn text_line(ty: &Arc<RecordType>, id: &str, entry: &str) -> anyhow::Result<Record> {
        let mut line = Record::new(ty);
        line.set_text("ID", id)?;
        line.set_text("ENTRY", entry)?;
        line.set_text("LENGTH", entry.len().to_string())?;
        Ok(line)
    }

    #[test]
    fn test_should_write_and_read_program_file() -> anyhow::Result<()> {
        let registry = registry();
        let progdir_ty = registry.record("PROGDIR")?;
        let tpool_ty = registry.table("TPOOL")?;
        let textpool_ty = registry.record("TEXTPOOL")?;

        let mut progdir = Record::new(progdir_ty);
        progdir.set_text("NAME", "ZHELLO")?;
        progdir.set_text("SUBC", "1")?;

        let mut tpool = Table::new(tpool_ty);
        tpool.append(text_line(textpool_ty, "R", "Hello report")?)?;

        let mut writer = InterchangeWriter::new("LCL_OBJECT_PROG")?;
        writer.add(&progdir)?.add(&tpool)?;
        let xml = writer.finish()?;
        tracing::info!(bytes = xml.len(), "program file");

        let expected = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<abapGit version=\"v1.0.0\" serializer=\"LCL_OBJECT_PROG\" serializer_version=\"v1.0.0\">\n \
<asx:abap xmlns:asx=\"http://www.sap.com/abapxml\" version=\"1.0\">\n  \
<asx:values>\n   \
<PROGDIR>\n    \
<NAME>ZHELLO</NAME>\n    \
<SUBC>1</SUBC>\n   \
</PROGDIR>\n   \
<TPOOL>\n    \
<item>\n     \
<ID>R</ID>\n     \
<ENTRY>Hello report</ENTRY>\n     \
<LENGTH>12</LENGTH>\n    \
</item>\n   \
</TPOOL>\n  \
</asx:values>\n \
</asx:abap>\n\
</abapGit>\n";
        assert_eq!(xml, expected);

        let expected_types = [TypeRef::from(progdir_ty), TypeRef::from(tpool_ty)];
        let bodies = from_interchange_xml(&xml, &expected_types)?;
        assert_eq!(bodies.serializer(), Some("LCL_OBJECT_PROG"));
        assert_eq!(bodies.record("PROGDIR"), Some(&progdir));
        assert_eq!(bodies.table("TPOOL"), Some(&tpool));

        // The generic decoder reads the first body straight through the abapGit root.
        assert_eq!(record_from_xml(&xml, progdir_ty)?, progdir);
        Ok(())
    }

    #[test]
    fn test_should_report_sequence_mismatch_after_first_body() -> anyhow::Result<()> {
        let registry = registry();
        let progdir_ty = registry.record("PROGDIR")?;
        let devc_ty = registry.record("DEVC")?;
        let tpool_ty = registry.table("TPOOL")?;

        let mut devc = Record::new(devc_ty);
        devc.set_text("CTEXT", "Demo package")?;
        let mut progdir = Record::new(progdir_ty);
        progdir.set_text("NAME", "ZHELLO")?;

        let mut writer = InterchangeWriter::new("LCL_OBJECT_PROG")?;
        writer.add(&progdir)?.add(&devc)?;
        let xml = writer.finish()?;

        let expected_types = [TypeRef::from(progdir_ty), TypeRef::from(tpool_ty)];
        match from_interchange_xml(&xml, &expected_types) {
            Err(XmlError::SequenceMismatch { expected, actual }) => {
                assert_eq!(expected, "TPOOL");
                assert_eq!(actual, "DEVC");
            }
            other => panic!("expected SequenceMismatch, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_should_read_package_file_leniently_and_strictly() -> anyhow::Result<()> {
        let registry = registry();
        let devc_ty = registry.record("DEVC")?;
        let tpool_ty = registry.table("TPOOL")?;

        let xml = "<?xml version=\"1.0\" encoding=\"utf-8\"?>
<abapGit version=\"v1.0.0\" serializer=\"LCL_OBJECT_DEVC\" serializer_version=\"v1.0.0\">
 <asx:abap xmlns:asx=\"http://www.sap.com/abapxml\" version=\"1.0\">
  <asx:values>
   <DEVC>
    <CTEXT>Tom &amp; Jerry</CTEXT>
   </DEVC>
  </asx:values>
 </asx:abap>
</abapGit>
";
        let expected_types = [TypeRef::from(devc_ty), TypeRef::from(tpool_ty)];

        let bodies = from_interchange_xml(xml, &expected_types)?;
        tracing::info!(serializer = ?bodies.serializer(), count = bodies.len(), "package file");
        assert_eq!(bodies.len(), 1);
        assert_eq!(
            bodies.record("DEVC").and_then(|r| r.text("CTEXT")),
            Some("Tom & Jerry")
        );

        let strict = CodecConfig {
            strict_sequence: true,
            ..CodecConfig::default()
        };
        let err = from_interchange_xml_with_config(xml, &expected_types, &strict)
            .expect_err("TPOOL is missing");
        assert!(matches!(err, XmlError::SequenceMismatch { .. }));
        Ok(())
    }
}
