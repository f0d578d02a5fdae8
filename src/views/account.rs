use super::AccountData;
use crate::models::{Profile, RedeemedCode};
use crate::state::ViewState;
use crate::ui::{escape, post_button};

const VIP_PAGE: &str = "https://www.thesecretsofdecoupage.com/pages/vip";

pub fn render(view: &ViewState, data: &AccountData, redeemed: Option<&RedeemedCode>) -> String {
    match &view.me {
        Some(me) => authenticated(me, data, redeemed),
        None => ANONYMOUS_FORM.to_string(),
    }
}

const ANONYMOUS_FORM: &str = r#"<h2>Login / Register</h2>
<form method="post" action="/account/login" class="grid" id="auth-form">
<input name="email" placeholder="Email" autocomplete="email">
<input name="password" placeholder="Password (min 8 chars)" type="password" autocomplete="current-password">
<input name="nickname" placeholder="Display name (public in community)" autocomplete="nickname">
<div class="row">
<button class="btn primary" type="submit">Login</button>
<button class="btn" type="submit" formaction="/account/register">Register</button>
</div>
<p class="small">If you are new, enter a <b>display name</b> (public), then tap <b>Register</b>. VIP accounts can see extra tips.</p>
</form>
"#;

fn authenticated(me: &Profile, data: &AccountData, redeemed: Option<&RedeemedCode>) -> String {
    let mut html = format!(
        r#"<h2>Account</h2>
<p>Hi <b>{name}</b> 👋</p>
<div class="item" id="plan">
<div class="row">
<div><div class="small">Your plan</div><div style="font-size:20px;font-weight:800;">{plan}</div></div>
<div class="row"><span class="pill">VIP: {vip}</span><span class="pill">Discount: {discount}%</span><span class="pill">Monthly credits: {monthly}</span>{admin}</div>
</div>
<p class="small">VIP sync works by matching your <b>app email</b> with the email used on Shopify.</p>
<div class="row">{sync}<a class="btn" rel="noopener" href="{VIP_PAGE}">View VIP plans</a></div>
</div>
"#,
        name = escape(me.display_name()),
        plan = escape(&me.plan_label()),
        vip = if me.is_vip { "Yes" } else { "No" },
        discount = me.discount_percent,
        monthly = me.monthly_credits,
        admin = if me.is_admin { r#"<span class="pill">Admin</span>"# } else { "" },
        sync = post_button("/account/sync-vip", "Sync VIP from Shopify", "btn"),
    );

    if !me.is_vip {
        html.push_str(PLANS);
    }

    html.push_str(&credits(me, redeemed));
    html.push_str(PASSWORD_FORM);
    html.push_str(SUPPORT_FORM);
    html.push_str(&format!(
        r#"<div class="item"><h3>Notifications</h3><p>Enable gentle updates when we add new tips and projects.</p>{}</div>
<div class="row">{}</div>
"#,
        post_button("/account/notifications", "Enable notifications", "btn"),
        post_button("/account/logout", "Logout", "btn danger"),
    ));

    if me.is_admin {
        html.push_str(&admin_settings(data));
    }
    html
}

const PLANS: &str = r#"<div class="item" id="plans">
<h3>Choose a VIP plan</h3>
<div class="grid">
<div class="item"><div class="meta"><div><b>VIP Digital</b> <span class="small">£9.99 / month</span></div><span class="pill">10% off</span></div><div class="small">VIP Library + VIP Club + 2 cliparts / month</div></div>
<div class="item"><div class="meta"><div><b>VIP Print Pack</b> <span class="small">£14.99 / month</span></div><span class="pill">4 credits</span></div><div class="small">4 credits / month + 2 cliparts / month • 10% off</div></div>
<div class="item"><div class="meta"><div><b>PRO Studio</b> <span class="small">£24.99 / month</span></div><span class="pill">8 credits</span></div><div class="small">8 credits / month + 4 cliparts / month • 12% off</div></div>
</div>
<p class="small">After subscribing on Shopify, come back here and tap <b>Sync VIP from Shopify</b>.</p>
</div>
"#;

fn credits(me: &Profile, redeemed: Option<&RedeemedCode>) -> String {
    let code = redeemed
        .map(|code| {
            format!(
                r#"<div class="item" id="redeemed"><div><b>Your code:</b> <span class="code">{code}</span></div><div class="small">Worth approx £{amount} • Expires: {expires}</div><div class="small">Copy it now and paste it at checkout.</div></div>"#,
                code = escape(&code.code),
                amount = escape(&code.amount_label()),
                expires = escape(&code.expires_label()),
            )
        })
        .unwrap_or_default();
    format!(
        r#"<div class="item" id="credits">
<h3>Credits</h3>
<div class="row">
<div><div class="small">Available</div><div style="font-size:34px;font-weight:900;">{balance}</div></div>
<div class="small"><div>1 credit = A4 rice paper</div><div>1 credit = A5 rice paper</div><div>1 credit = Greeting Card size</div><div><b>A3 = 2 credits</b></div></div>
</div>
<details{open}>
<summary><b>Redeem credits</b> (generates a one-time discount code)</summary>
<p class="small">The code is valid for <b>30 days</b>, <b>one-time</b>, and works only for your Shopify email.</p>
<form method="post" action="/account/redeem" class="row"><input name="credits" type="number" min="1" step="1" placeholder="How many credits?" style="max-width:200px;"><button class="btn primary" type="submit">Generate code</button></form>
{code}
</details>
</div>
"#,
        balance = me.credits_balance,
        open = if redeemed.is_some() { " open" } else { "" },
    )
}

const PASSWORD_FORM: &str = r#"<div class="item" id="password">
<h3>Change password</h3>
<p class="small">Use at least 8 characters.</p>
<form method="post" action="/account/password" class="grid">
<input name="old_password" placeholder="Current password" type="password" autocomplete="current-password">
<input name="new_password" placeholder="New password (min 8 chars)" type="password" autocomplete="new-password">
<button class="btn" type="submit">Update password</button>
</form>
</div>
"#;

const SUPPORT_FORM: &str = r#"<div class="item" id="support">
<h3>Order help (private)</h3>
<p class="small">Questions about orders, delivery or refunds go to our team, not the public community.</p>
<form method="post" action="/account/support" enctype="multipart/form-data" class="grid">
<input name="subject" placeholder="Subject">
<input name="order_number" placeholder="Order number (optional)">
<textarea name="message" placeholder="How can we help?"></textarea>
<input name="file" type="file" accept="image/*">
<button class="btn primary" type="submit">Send</button>
</form>
</div>
"#;

fn admin_settings(data: &AccountData) -> String {
    format!(
        r#"<details class="item" id="admin-settings">
<summary><b>Admin settings</b> <span class="small">(only visible to admins)</span></summary>
<p class="small">Customers will not see these settings.</p>
<form method="post" action="/account/settings">
<div class="small">Backend URL</div>
<input name="api_url" placeholder="http://localhost:8000" value="{api_url}">
<div class="small">Shopify Storefront config (optional)</div>
<input name="shop_domain" placeholder="your-shop.myshopify.com" value="{shop_domain}">
<input name="shop_token" placeholder="Storefront API Access Token" value="{shop_token}">
<div class="row"><button class="btn" type="submit">Save</button></div>
</form>
</details>
"#,
        api_url = escape(&data.api_url),
        shop_domain = escape(&data.shop_domain),
        shop_token = escape(&data.shop_token),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::fixtures::profile;

    #[test]
    fn anonymous_view_is_the_login_form() {
        let html = render(&ViewState::default(), &AccountData::default(), None);
        assert!(html.contains("Login / Register"));
        assert!(html.contains(r#"formaction="/account/register""#));
        assert!(!html.contains("Logout"));
    }

    #[test]
    fn members_see_dashboard_without_admin_settings() {
        let mut view = ViewState::default();
        view.me = Some(profile(false, false));
        let html = render(&view, &AccountData::default(), None);
        assert!(html.contains("Hi <b>Ola</b>"));
        assert!(html.contains("Discount: 10%"));
        assert!(html.contains(r#"id="plans""#));
        assert!(html.contains(r#"id="support""#));
        assert!(!html.contains("admin-settings"));
        assert!(!html.contains("Login / Register"));
    }

    #[test]
    fn admins_see_current_settings() {
        let mut view = ViewState::default();
        view.me = Some(profile(true, true));
        let data = AccountData {
            api_url: "http://localhost:8000".into(),
            shop_domain: "sod.myshopify.com".into(),
            shop_token: "tok\"en".into(),
        };
        let html = render(&view, &data, None);
        assert!(html.contains(r#"value="http://localhost:8000""#));
        assert!(html.contains(r#"value="tok&quot;en""#));
        assert!(!html.contains(r#"id="plans""#));
    }

    #[test]
    fn redeemed_code_is_shown() {
        let mut view = ViewState::default();
        view.me = Some(profile(false, true));
        let code = RedeemedCode {
            code: "SOD-XYZ".into(),
            amount_gbp: serde_json::json!("4.00"),
            expires_at: Some("2026-11-18T00:00:00Z".into()),
        };
        let html = render(&view, &AccountData::default(), Some(&code));
        assert!(html.contains("SOD-XYZ"));
        assert!(html.contains("£4.00"));
        assert!(html.contains("<details open>"));
    }
}
