#![cfg(target_os = "android")]

use anyhow::{anyhow, Context};
use jni::objects::{GlobalRef, JObject, JString, JValue, JValueOwned};
use jni::{AttachGuard, JavaVM};
use std::ops::Deref;
use std::path::{Path, PathBuf};

pub(crate) const J_STRING: &str = "()Ljava/lang/String;";
pub(crate) const J_FILE: &str = "()Ljava/io/File;";

/// see https://developer.android.com/reference/android/content/Intent#FLAG_GRANT_READ_URI_PERMISSION
const FLAG_GRANT_READ_URI_PERMISSION: i32 = 0x0000_0001;
/// see https://developer.android.com/reference/android/content/Intent#FLAG_ACTIVITY_NEW_TASK
const FLAG_ACTIVITY_NEW_TASK: i32 = 0x1000_0000;

pub(crate) struct AndroidUtil {
    ctx: JObject<'static>,
    vm: JavaVM,
}

impl AndroidUtil {
    pub(crate) fn create() -> anyhow::Result<AndroidUtil> {
        let ctx = ndk_context::android_context();
        let obj = unsafe { JObject::from_raw(ctx.context().cast()) };
        let vm = (unsafe { JavaVM::from_raw(ctx.vm().cast()) })
            .context("Could not get JavaVM from raw")?;
        Ok(AndroidUtil { ctx: obj, vm })
    }

    pub(crate) fn get_conf_dir(&self) -> anyhow::Result<PathBuf> {
        let files_dir_obj = self.call_ctx_method("getFilesDir", J_FILE, &[])?;
        let abs_path_ref = self.call_method(&files_dir_obj, "getAbsolutePath", J_STRING, &[])?;
        Ok(PathBuf::from(self.global_ref_to_string(abs_path_ref)?))
    }

    /// Opens the package installer for the APK at `path`.
    ///
    /// The file is shared through the app's `FileProvider` (authority `<package>.fileprovider`),
    /// which has to be declared in the manifest.
    pub(crate) fn open_package_archive(&self, path: &Path, mime_type: &str) -> anyhow::Result<()> {
        let uri = self.content_uri(path)?;
        let intent = self.new_view_intent()?;
        self.call_method(
            &intent,
            "setDataAndType",
            "(Landroid/net/Uri;Ljava/lang/String;)Landroid/content/Intent;",
            &[JValue::from(uri.as_obj()), JValue::from(self.new_string(mime_type)?.as_obj())],
        )?;
        self.call_method(
            &intent,
            "addFlags",
            "(I)Landroid/content/Intent;",
            &[JValue::Int(FLAG_GRANT_READ_URI_PERMISSION | FLAG_ACTIVITY_NEW_TASK)],
        )?;
        self.start_activity(&intent)
    }

    /// see https://developer.android.com/reference/androidx/core/content/FileProvider#getUriForFile(android.content.Context,java.lang.String,java.io.File)
    fn content_uri(&self, path: &Path) -> anyhow::Result<GlobalRef> {
        let path_str = path.to_str().ok_or_else(|| anyhow!("Invalid artifact path {path:?}"))?;
        let file = self.new_object(
            "java/io/File",
            "(Ljava/lang/String;)V",
            &[JValue::from(self.new_string(path_str)?.as_obj())],
        )?;
        let package_name_ref = self.call_ctx_method("getPackageName", J_STRING, &[])?;
        let authority = format!("{}.fileprovider", self.global_ref_to_string(package_name_ref)?);

        self.call_static_method(
            "androidx/core/content/FileProvider",
            "getUriForFile",
            "(Landroid/content/Context;Ljava/lang/String;Ljava/io/File;)Landroid/net/Uri;",
            &[
                JValue::from(&self.ctx),
                JValue::from(self.new_string(&authority)?.as_obj()),
                JValue::from(file.as_obj()),
            ],
        )
    }

    /// see https://developer.android.com/reference/android/content/Context#startActivity(android.content.Intent)
    fn start_activity(&self, intent: &GlobalRef) -> anyhow::Result<()> {
        let mut env = self.get_env()?;
        env.call_method(&self.ctx, "startActivity", "(Landroid/content/Intent;)V", &[
            JValue::from(intent.as_obj()),
        ])
        .context("Failed to call startActivity")?;
        Ok(())
    }

    /// see https://developer.android.com/reference/android/content/Intent
    fn new_view_intent(&self) -> anyhow::Result<GlobalRef> {
        self.new_object(
            "android/content/Intent",
            "(Ljava/lang/String;)V",
            &[JValue::from(self.new_string("android.intent.action.VIEW")?.as_obj())],
        )
    }

    fn call_ctx_method(&self, name: &str, sig: &str, args: &[JValue]) -> anyhow::Result<GlobalRef> {
        let mut env = self.get_env()?;
        let call_result = env.call_method(&self.ctx, name, sig, args);
        Self::create_global_ref(&env, Self::unpack_call_result(call_result)?)
    }

    fn call_method(
        &self,
        obj: &GlobalRef,
        name: &str,
        sig: &str,
        args: &[JValue],
    ) -> anyhow::Result<GlobalRef> {
        let mut env = self.get_env()?;
        let call_result = env.call_method(obj.as_obj(), name, sig, args);
        Self::create_global_ref(&env, Self::unpack_call_result(call_result)?)
    }

    fn call_static_method(
        &self,
        class: &str,
        name: &str,
        sig: &str,
        args: &[JValue],
    ) -> anyhow::Result<GlobalRef> {
        let mut env = self.get_env()?;
        let call_result = env.call_static_method(class, name, sig, args);
        Self::create_global_ref(&env, Self::unpack_call_result(call_result)?)
    }

    fn new_string(&self, string: &str) -> anyhow::Result<GlobalRef> {
        let env = self.get_env()?;
        let j_string = env.new_string(string).context("Failed to create new string")?;
        Self::create_global_ref(&env, j_string.into())
    }

    fn new_object(&self, class: &str, sig: &str, args: &[JValue]) -> anyhow::Result<GlobalRef> {
        let mut env = self.get_env()?;
        let obj = env.new_object(class, sig, args).context("Failed to create new object")?;
        Self::create_global_ref(&env, obj)
    }

    fn global_ref_to_string(&self, global_ref: GlobalRef) -> anyhow::Result<String> {
        let mut env = self.get_env()?;
        let j_str: &JString =
            global_ref.deref().try_into().map_err(|err| anyhow!("Failed to deref: {err:?}"))?;
        let rust_str: String = env.get_string(j_str).context("Failed to get_string")?.into();
        Ok(rust_str)
    }

    fn create_global_ref(env: &AttachGuard, o: JObject) -> anyhow::Result<GlobalRef> {
        env.new_global_ref(o).context("Failed to create global ref")
    }

    fn get_env(&self) -> anyhow::Result<AttachGuard<'_>> {
        self.vm.attach_current_thread().context("Failed to attach vm to current thread")
    }

    fn unpack_call_result(result: jni::errors::Result<JValueOwned>) -> anyhow::Result<JObject> {
        result.context("Failed to call method")?.l().context("Failed to unwrap method call result")
    }
}
