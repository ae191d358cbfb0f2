//! Generic `asx:abap` envelope scenarios.

#[cfg(test)]
mod tests {
    use sapcli_xml::{
        Record, Table, TypeRef, Value, XmlError, from_xml, record_from_xml, to_xml,
    };

    use crate::registry;

    const HEADER: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<asx:abap xmlns:asx=\"http://www.sap.com/abapxml\" version=\"1.0\">\n \
<asx:values>\n";
    const FOOTER: &str = " </asx:values>\n</asx:abap>\n";

    #[test]
    fn test_should_round_trip_program_metadata() -> anyhow::Result<()> {
        let registry = registry();
        let ty = registry.record("PROGDIR")?;

        let mut progdir = Record::new(ty);
        progdir.set_text("NAME", "ZHELLO_WORLD")?;
        progdir.set_text("STATE", "A")?;
        progdir.set_text("SUBC", "1")?;
        progdir.set_text("FIXPT", "X")?;
        progdir.set_text("UCCHECK", "X")?;
        progdir.set_text("LDBNAME", "")?;

        let xml = to_xml(&progdir, None)?;
        let body = "  <PROGDIR>\n   \
<NAME>ZHELLO_WORLD</NAME>\n   \
<STATE>A</STATE>\n   \
<SUBC>1</SUBC>\n   \
<FIXPT>X</FIXPT>\n   \
<LDBNAME></LDBNAME>\n   \
<UCCHECK>X</UCCHECK>\n  \
</PROGDIR>\n";
        assert_eq!(xml, format!("{HEADER}{body}{FOOTER}"));

        let back = record_from_xml(&xml, ty)?;
        assert_eq!(back, progdir);
        assert_eq!(back.text("LDBNAME"), Some(""));
        assert_eq!(back.text("DBAPL"), None);
        Ok(())
    }

    #[test]
    fn test_should_decode_check_run_with_mixed_tables() -> anyhow::Result<()> {
        let registry = registry();
        let ty = registry.resolve("CHECK_RUN")?;

        let xml = format!(
            "{HEADER}  <CHECK_RUN>\n   <OBJECT>ZCL_DEMO</OBJECT>\n   <STATUS>processed</STATUS>\n   \
             <INCLUDES>\n    <INCLUDE>\n     <NAME>ZCL_DEMO=====CP</NAME>\n     <TYPE>main</TYPE>\n    </INCLUDE>\n    \
             <INCLUDE>\n     <NAME>ZCL_DEMO=====CCAU</NAME>\n     <TYPE>testclasses</TYPE>\n    </INCLUDE>\n   </INCLUDES>\n   \
             <MESSAGES>\n    <item>Syntax check OK</item>\n    <item>2 &lt; 3 warnings</item>\n   </MESSAGES>\n  </CHECK_RUN>\n{FOOTER}"
        );

        let value = from_xml(&xml, ty)?;
        let run = value.as_record().expect("record body");
        assert_eq!(run.text("OBJECT"), Some("ZCL_DEMO"));

        let includes = run.get("INCLUDES").and_then(Value::as_table).expect("includes");
        let names: Vec<&str> = includes
            .iter()
            .filter_map(Value::as_record)
            .filter_map(|r| r.text("NAME"))
            .collect();
        tracing::info!(?names, "check run includes");
        assert_eq!(names, vec!["ZCL_DEMO=====CP", "ZCL_DEMO=====CCAU"]);

        let messages = run.get("MESSAGES").and_then(Value::as_table).expect("messages");
        let texts: Vec<&str> = messages.iter().filter_map(Value::as_text).collect();
        assert_eq!(texts, vec!["Syntax check OK", "2 < 3 warnings"]);

        // Re-encoding reproduces the document byte for byte.
        assert_eq!(to_xml(&value, None)?, xml);
        Ok(())
    }

    #[test]
    fn test_should_abort_on_unknown_member_without_partial_result() -> anyhow::Result<()> {
        let registry = registry();
        let ty = registry.record("PROGDIR")?;
        let xml = format!(
            "{HEADER}  <PROGDIR>\n   <NAME>ZX</NAME>\n   <AUTHOR>DEVELOPER</AUTHOR>\n  </PROGDIR>\n{FOOTER}"
        );

        match record_from_xml(&xml, ty) {
            Err(XmlError::UnknownMember {
                type_name,
                field_name,
            }) => {
                assert_eq!(type_name, "PROGDIR");
                assert_eq!(field_name, "AUTHOR");
            }
            other => panic!("expected UnknownMember, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_should_reject_foreign_row_type() -> anyhow::Result<()> {
        let registry = registry();
        let check_run = registry.record("CHECK_RUN")?;
        let includes = registry.table("INCLUDES")?;
        let devc = registry.record("DEVC")?;

        let mut table = Table::new(includes);
        let err = table
            .append(Record::new(devc))
            .expect_err("DEVC rows do not belong in INCLUDES");
        assert!(matches!(err, XmlError::TypeMismatch { .. }));
        assert!(table.is_empty());

        let mut run = Record::new(check_run);
        run.set("INCLUDES", table)?;
        let xml = to_xml(&run, Some("RUN"))?;
        assert!(xml.contains("  <RUN>\n   <INCLUDES>\n   </INCLUDES>\n  </RUN>\n"));

        let back = sapcli_xml::from_xml_as(&xml, &TypeRef::from(check_run), "RUN")?;
        assert_eq!(back, Value::Record(run));
        Ok(())
    }
}
