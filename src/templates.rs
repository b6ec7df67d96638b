use minijinja::Environment;
use serde_json::json;

use crate::{error::Result, stack::Stack};

const SUMMARY: &str = r#"stack {{ stack }} ({{ region }}): {{ declarations|length }} declarations, {{ object_count }} objects
{% for d in declarations %}  {{ loop.index }}. {{ d.kind }} {{ d.name }} [{{ d.type }}]{% if d.provider %} via {{ d.provider }}{% endif %}{% if d.depends_on %} after {{ d.depends_on|join(", ") }}{% endif %}
{% endfor %}"#;

/// Plain-text listing of a stack in dependency order.
pub fn render_summary(stack: &Stack, region: &str) -> Result<String> {
    let declarations: Vec<_> = stack
        .declarations()
        .iter()
        .map(|d| {
            let depends_on: Vec<&String> = stack
                .dependencies_of(&d.name)
                .map(|s| s.iter().collect())
                .unwrap_or_default();
            json!({
                "name": d.name,
                "kind": d.kind.as_str(),
                "type": d.rtype.token(),
                "provider": d.provider,
                "depends_on": depends_on,
            })
        })
        .collect();

    let ctx_json = json!({
        "stack": stack.name(),
        "region": region,
        "object_count": stack.objects().count(),
        "declarations": declarations,
    });

    render_minijinja(SUMMARY, &ctx_json)
}

fn render_minijinja(source: &str, ctx_json: &serde_json::Value) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("summary", source)?;
    let tpl = env.get_template("summary")?;
    let v = minijinja::value::Value::from_serialize(ctx_json);
    Ok(tpl.render(v)?)
}
