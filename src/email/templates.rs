pub fn render_password_reset(token: &str, reset_url: Option<&str>, ttl_minutes: i64) -> String {
    let link = match reset_url {
        Some(base) => {
            let separator = if base.contains('?') { '&' } else { '?' };
            format!(
                r#"
    <p><a href="{base}{separator}token={token}" style="display: inline-block; padding: 10px 20px; background: #0070f3; color: white; text-decoration: none; border-radius: 4px;">Reset Password</a></p>"#
            )
        }
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Password Reset</h2>
    <p>Your token to reset the password: <code>{token}</code></p>{link}
    <p style="color: #666; font-size: 14px;">This token expires in {ttl_minutes} minutes. If you didn't request this, you can ignore it.</p>
</body>
</html>"#
    )
}
