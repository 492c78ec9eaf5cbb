use hana_translator::prelude::*;
use pretty_assertions::assert_eq;

fn quiet() -> Translator {
    Translator::new(
        Config::builder()
            .comments(false)
            .remove_default_schema(true)
            .build(),
    )
}

#[test]
fn test_template_query() {
    let translation = quiet()
        .translate("select id, item, NAME, isnull(qty,0) as qty from DB.dbo.[@table] as t0 where id = {0}")
        .expect("template query should translate");
    assert_eq!(
        translation.text,
        "SELECT id, item, NAME, IFNULL(qty, 0) AS \"qty\" FROM DB.\"@table\" t0 WHERE id = {0};"
    );
    assert_eq!(translation.errors(), 0);
    let fixes = translation
        .summary
        .category(NoteCategory::IdentifierFix)
        .expect("schema removal is reported");
    assert_eq!(fixes.messages[0].text, "Schema dbo was removed");
}

#[test]
fn test_schema_kept_when_asked() {
    let translator = Translator::new(Config::builder().comments(false).build());
    let translation = translator.translate("select a from dbo.T").unwrap();
    assert_eq!(translation.text, "SELECT a FROM \"dbo\".T;");
}

#[test]
fn test_dateadd() {
    let translation = quiet()
        .translate("select dateadd(month, 1, DocDate) from OINV")
        .unwrap();
    assert_eq!(translation.text, "SELECT ADD_MONTHS(DocDate, 1) FROM OINV;");
    assert!(translation.is_clean());

    let translation = quiet()
        .translate("select dateadd(tzoffset, 1, DocDate) from OINV")
        .unwrap();
    assert_eq!(translation.errors(), 1);
    let errors = translation
        .summary
        .category(NoteCategory::RewriteError)
        .unwrap();
    assert_eq!(
        errors.messages[0].text,
        "DATEADD with date part tzoffset is not supported"
    );
}

#[test]
fn test_drop_table_split() {
    let translation = hana_translator::translate("DROP TABLE A, B, C").unwrap();
    assert_eq!(
        translation.text,
        "DROP TABLE A;\nDROP TABLE B;\nDROP TABLE C;\n\
         -- translation: DROP TABLE with 3 objects was split into 3 statements"
    );
    assert_eq!(translation.statements(), 3);
}

#[test]
fn test_subquery() {
    let translation = quiet()
        .translate(
            "select T0.CardCode from OCRD T0 \
             where T0.CardCode in (select T1.CardCode from OINV T1 where T1.DocTotal > 100)",
        )
        .unwrap();
    assert!(translation.text.starts_with("SELECT T0.CardCode FROM OCRD T0 WHERE T0.CardCode IN ("));
    assert!(translation.text.contains("SELECT T1.CardCode FROM OINV T1 WHERE T1.DocTotal > 100"));
    assert!(translation.is_clean());
}

#[test]
fn test_business_query() {
    let source = "\
        select t0.DocEntry, cast(t1.DocNum as nvarchar(50)) as DocNum,
               case when t0.Quantity > 0 then 'open' else 'closed' end as State
        from dbo.RDR1 t0
        inner join dbo.ORDR t1 on t1.DocEntry = t0.DocEntry
        left join OITM t2 on t2.ItemCode = t0.ItemCode
        where t1.DocNum = '{obj.DocNum}' and t0.LineStatus in ('O', 'C')
        order by t0.LineNum";
    let translation = quiet().translate(source).unwrap();
    let text = &translation.text;
    assert!(text.contains("CAST(t1.DocNum AS NVARCHAR(50)) AS \"DocNum\""));
    assert!(text.contains("CASE WHEN t0.Quantity > 0 THEN 'open' ELSE 'closed' END AS \"State\""));
    assert!(text.contains("FROM RDR1 t0 INNER JOIN ORDR t1 ON t1.DocEntry = t0.DocEntry"));
    assert!(text.contains("LEFT OUTER JOIN OITM t2 ON t2.ItemCode = t0.ItemCode"));
    assert!(text.contains("t1.DocNum = '{obj.DocNum}'"));
    assert!(text.contains("t0.LineStatus IN ('O', 'C')"));
    assert!(text.ends_with("ORDER BY t0.LineNum;"));
    assert_eq!(translation.errors(), 0);
}

#[test]
fn test_comments_survive() {
    let translation = quiet()
        .translate("select a -- the key\nfrom T /* done */")
        .unwrap();
    assert!(translation.text.contains("-- the key\n"));
    assert!(translation.text.contains("/* done */"));
}

#[test]
fn test_notes_are_written_by_default() {
    let translation = hana_translator::translate("select getdate()").unwrap();
    assert_eq!(
        translation.text,
        "SELECT NOW() FROM DUMMY;\n-- translation: FROM DUMMY was added"
    );
    assert!(translation.summary.category(NoteCategory::Rewrite).is_none());
}

#[test]
fn test_pretty_output() {
    let translator = Translator::new(Config::builder().pretty(true).comments(false).build());
    let translation = translator
        .translate("select a, b from T where a = 1 order by b")
        .unwrap();
    assert_eq!(translation.text, "SELECT a, b\nFROM T\nWHERE a = 1\nORDER BY b;");
}

#[test]
fn test_procedure() {
    let source = "\
        create procedure dbo.GetOrders @CardCode nvarchar(15) as
        begin
            set nocount on
            select DocEntry from ORDR where CardCode = @CardCode
        end";
    let translation = quiet().translate(source).unwrap();
    let text = &translation.text;
    assert!(text.starts_with("CREATE PROCEDURE GetOrders (IN CardCode NVARCHAR(15)) LANGUAGE SQLSCRIPT AS\nBEGIN"));
    assert!(text.contains("WHERE CardCode = :CardCode;"));
    assert!(text.ends_with("END;"));
}

#[test]
fn test_json_report() {
    let translation = quiet().translate("select a from T").unwrap();
    let json = serde_json::to_value(&translation).unwrap();
    assert_eq!(json["text"], "SELECT a FROM T;");
    assert_eq!(json["summary"]["statements"], 1);
}

#[test]
fn test_unterminated_string_fails() {
    let err = quiet().translate("select 'abc").unwrap_err();
    assert!(matches!(err, TranslateError::Lex { .. }));
}

#[test]
fn test_comments_of_an_untranslated_call_keep_their_order() {
    let translation = quiet()
        .translate("select /*c1*/ datediff(/*c2*/ month, /*c3*/ a, b /*c4*/) from T -- c5")
        .unwrap();
    let positions: Vec<usize> = ["/*c1*/", "/*c2*/", "/*c3*/", "/*c4*/", "-- c5"]
        .iter()
        .map(|comment| translation.text.find(comment).expect("comment kept"))
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]), "{}", translation.text);
    assert_eq!(translation.errors(), 1);
}
