use dashchart::format::{
    NumberFormatter, ValueFormatter, create_boolean_formatter, create_datetime_formatter,
    create_number_formatter, format_simple_template,
};
use serde_json::{Map, Value, json};

fn context(v: Value) -> Map<String, Value> {
    v.as_object().cloned().unwrap()
}

#[test]
fn templates_never_fail_on_odd_input() {
    let ctx = context(json!({"@@name": "Sales", "region": "north", "n": 3}));
    assert_eq!(format_simple_template("{{ @@name }}: {{region}}", &ctx), "Sales: north");
    assert_eq!(format_simple_template("{{ unknown }}!", &ctx), "!");
    for odd in ["{{", "}}", "{{ }}", "{{{n}}}", "", "plain"] {
        let _ = format_simple_template(odd, &ctx);
    }
    assert_eq!(format_simple_template("{{n}}", &Map::new()), "");
}

#[test]
fn numeral_style_numbers() {
    let f = create_number_formatter("0,0.00");
    assert_eq!(f.format(&json!(1234.5)), "1,234.50");
    assert_eq!(f.format(&json!("12")), "12.00");
    assert_eq!(f.format(&json!("n/a")), "n/a");
    assert_eq!(f.format(&Value::Null), "");
    assert_eq!(create_number_formatter("0.0a").format(&json!(1_500_000)), "1.5m");
    assert_eq!(create_number_formatter("$0,0").format(&json!(-2500)), "-$2,500");
    assert_eq!(create_number_formatter("(0,0)").format(&json!(-2500)), "(2,500)");
    assert_eq!(NumberFormatter::with_locale("0,0", "de").format(&json!(1234567)), "1.234.567");
}

#[test]
fn moment_style_dates() {
    let f = create_datetime_formatter("YYYY-MM-DD HH:mm");
    assert_eq!(f.format(&json!("2024-03-05T14:07:09Z")), "2024-03-05 14:07");
    assert_eq!(f.format(&json!("not a date")), "not a date");
    assert_eq!(create_datetime_formatter("D MMM YYYY").format(&json!("2024-03-05")), "5 Mar 2024");
}

#[test]
fn boolean_labels() {
    let yes_no = create_boolean_formatter(&["no".to_string(), "yes".to_string()]);
    assert_eq!(yes_no.format(&json!(true)), "yes");
    assert_eq!(yes_no.format(&json!(false)), "no");
    assert_eq!(yes_no.format(&Value::Null), "");
    assert_eq!(create_boolean_formatter(&[]).format(&json!(false)), "false");
}
